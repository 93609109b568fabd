//! Alert payloads sent to the notification hub.
//!
//! Field names are PascalCase on the wire, matching the hub's existing
//! contract (the same convention rule files use).

use serde::{Deserialize, Serialize};

/// An out-of-bounds alert for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterAlert {
    pub parameter_name: String,
    #[serde(default = "default_has_alert")]
    pub has_alert: bool,
    pub value: String,
    pub time: String,
    /// Lower bound lifted from the rule expression; blank when the
    /// expression carries none.
    pub low_limit: String,
    pub high_limit: String,
    pub message: String,
}

/// An alert for a correlated multi-parameter rule match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComplexAlert {
    #[serde(default = "default_has_alert")]
    pub has_alert: bool,
    pub rule_name: String,
    /// The rule expression that matched.
    pub rule: String,
    /// Contributing values joined with `" | "` in arrival order.
    pub parameter_and_values: String,
    pub time: String,
}

fn default_has_alert() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_alert_serializes_pascal_case() {
        let alert = ParameterAlert {
            parameter_name: "P1".into(),
            has_alert: true,
            value: "42".into(),
            time: "2026-08-30T12:00:00Z".into(),
            low_limit: "10".into(),
            high_limit: "100".into(),
            message: "P1 Not Ok".into(),
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["ParameterName"], "P1");
        assert_eq!(json["HasAlert"], true);
        assert_eq!(json["LowLimit"], "10");
    }

    #[test]
    fn has_alert_defaults_to_true_on_deserialize() {
        let alert: ComplexAlert = serde_json::from_str(
            r#"{ "RuleName": "R", "Rule": "expr",
                 "ParameterAndValues": "1 | 2", "Time": "t" }"#,
        )
        .unwrap();
        assert!(alert.has_alert);
    }
}
