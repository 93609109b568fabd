//! Workflow and rule definitions as loaded from `rule.json`.
//!
//! Field names are PascalCase on disk, matching the rule files the
//! monitoring stack already ships:
//!
//! ```json
//! [
//!   {
//!     "WorkflowName": "TemperatureCheck",
//!     "Rules": [
//!       { "RuleName": "TemperatureOutOfRange",
//!         "Expression": "Temperature > 10 And Temperature < 100" }
//!     ]
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// A named rule-set. Loaded once at scheduler start, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workflow {
    pub workflow_name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One boolean rule inside a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub rule_name: String,
    pub expression: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Workflow {
    /// The workflow's first rule, if any. Dispatch formats are keyed off
    /// this rule's name and expression.
    pub fn first_rule(&self) -> Option<&Rule> {
        self.rules.first()
    }
}

/// The first enabled rule expression across the first workflow.
///
/// The multi-parameter scheduler derives its slot bindings from this
/// expression at initialization time.
pub fn first_enabled_expression(workflows: &[Workflow]) -> Option<&str> {
    workflows
        .first()?
        .rules
        .iter()
        .find(|r| r.enabled)
        .map(|r| r.expression.as_str())
}
