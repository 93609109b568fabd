//! Typed evaluable inputs handed to the rule evaluation engine.
//!
//! The upstream system fed the engine duck-typed JSON objects built from
//! rule-expression text. Here the record is explicit: a name (either the
//! raw parameter id or a correlation slot such as `input1`) and a typed
//! field map, so evaluators can resolve `input1.Temperature` without
//! string-matching serialized JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// A named-field record built from one sample, consumed by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluableInput {
    /// Record name: the parameter id for single-parameter rules, or the
    /// slot name (`input1`…`input5`) for correlated rules.
    pub name: String,
    /// Field values keyed by parameter name.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl EvaluableInput {
    /// Wrap a sample as a one-field record keyed by its own parameter id.
    ///
    /// Numeric values are stored as JSON numbers so comparison operators
    /// see scalars; anything unparseable stays a string.
    pub fn from_sample(sample: &Sample) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(sample.id.clone(), scalar_value(&sample.value));
        Self {
            name: sample.id.clone(),
            fields,
        }
    }

    /// Build a slot-named record (`input1`…`input5`) for a correlated sample.
    pub fn for_slot(slot: impl Into<String>, sample: &Sample) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(sample.id.clone(), scalar_value(&sample.value));
        Self {
            name: slot.into(),
            fields,
        }
    }

    /// Look up a field by parameter name.
    pub fn field(&self, parameter: &str) -> Option<&serde_json::Value> {
        self.fields.get(parameter)
    }

    /// Whether this record carries the given parameter.
    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.fields.contains_key(parameter)
    }
}

/// Parse a string-encoded scalar into the tightest JSON value.
fn scalar_value(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return serde_json::Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return serde_json::Value::from(f);
    }
    if let Ok(b) = trimmed.parse::<bool>() {
        return serde_json::Value::from(b);
    }
    serde_json::Value::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_sample_keys_by_parameter_id() {
        let sample = Sample::new("P1", "42", "m1");
        let input = EvaluableInput::from_sample(&sample);
        assert_eq!(input.name, "P1");
        assert_eq!(input.field("P1"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn for_slot_uses_slot_name() {
        let sample = Sample::new("Temperature", "21.5", "m1");
        let input = EvaluableInput::for_slot("input1", &sample);
        assert_eq!(input.name, "input1");
        assert!(input.has_parameter("Temperature"));
        assert_eq!(input.field("Temperature"), Some(&serde_json::json!(21.5)));
    }

    #[test]
    fn non_numeric_values_stay_strings() {
        let sample = Sample::new("Mode", "auto", "m1");
        let input = EvaluableInput::from_sample(&sample);
        assert_eq!(input.field("Mode"), Some(&serde_json::json!("auto")));
    }

    #[test]
    fn boolean_values_parse() {
        let sample = Sample::new("DoorOpen", "true", "m1");
        let input = EvaluableInput::from_sample(&sample);
        assert_eq!(input.field("DoorOpen"), Some(&serde_json::json!(true)));
    }
}
