//! A small numeric rule evaluator.
//!
//! Handles conjunctions of comparison clauses, the shape virtually all
//! shipped rule files take:
//!
//! ```text
//! Temperature > 10 And Temperature < 100
//! input1.Temperature > 30 And input2.Pressure < 1000
//! ```
//!
//! Each clause is `path op literal`, where `path` is either a bare
//! parameter name or `record.parameter`, `op` is one of
//! `> < >= <= == !=`, and the literal is a number. Richer engines plug
//! in behind [`RuleEvaluator`] without touching the schedulers.

use regex::Regex;
use tracing::debug;

use edgerule_core::EvaluableInput;

use crate::error::RuleError;
use crate::evaluator::{RuleEvaluator, RuleOutcome};
use crate::schema::Workflow;

pub struct BoundsEvaluator {
    clause_split: Regex,
    clause: Regex,
}

impl BoundsEvaluator {
    pub fn new() -> Self {
        Self {
            clause_split: Regex::new(r"\s+[Aa][Nn][Dd]\s+|\s*&&\s*")
                .expect("clause split regex is valid"),
            clause: Regex::new(r"^\s*([A-Za-z_][\w.]*)\s*(>=|<=|==|!=|>|<)\s*(-?\d+(?:\.\d+)?)\s*$")
                .expect("clause regex is valid"),
        }
    }

    fn evaluate_expression(
        &self,
        expression: &str,
        inputs: &[EvaluableInput],
    ) -> Result<bool, RuleError> {
        for clause in self.clause_split.split(expression) {
            let caps = self.clause.captures(clause).ok_or_else(|| {
                RuleError::Evaluation(format!("unsupported clause: {clause:?}"))
            })?;
            let path = &caps[1];
            let op = &caps[2];
            let literal: f64 = caps[3]
                .parse()
                .map_err(|_| RuleError::Evaluation(format!("bad literal in {clause:?}")))?;

            let value = resolve(path, inputs).ok_or_else(|| {
                RuleError::Evaluation(format!("no input carries {path}"))
            })?;

            let holds = match op {
                ">" => value > literal,
                "<" => value < literal,
                ">=" => value >= literal,
                "<=" => value <= literal,
                "==" => value == literal,
                "!=" => value != literal,
                _ => unreachable!("operator set is fixed by the clause regex"),
            };
            if !holds {
                debug!(clause, value, "clause did not hold");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for BoundsEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `parameter` or `record.parameter` against the input batch.
///
/// A bare name matches the first input carrying that parameter; a dotted
/// path requires the record name to match too.
fn resolve(path: &str, inputs: &[EvaluableInput]) -> Option<f64> {
    let (record, parameter) = match path.split_once('.') {
        Some((record, parameter)) => (Some(record), parameter),
        None => (None, path),
    };
    inputs
        .iter()
        .filter(|input| record.map_or(true, |r| input.name == r))
        .find_map(|input| input.field(parameter))
        .and_then(serde_json::Value::as_f64)
}

impl RuleEvaluator for BoundsEvaluator {
    fn evaluate(
        &self,
        workflows: &[Workflow],
        workflow_name: &str,
        inputs: &[EvaluableInput],
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let workflow = workflows
            .iter()
            .find(|w| w.workflow_name == workflow_name)
            .ok_or_else(|| {
                RuleError::Validation(format!("unknown workflow {workflow_name}"))
            })?;

        let mut outcomes = Vec::with_capacity(workflow.rules.len());
        for rule in &workflow.rules {
            let is_success = if rule.enabled {
                self.evaluate_expression(&rule.expression, inputs)?
            } else {
                false
            };
            outcomes.push(RuleOutcome::new(rule.rule_name.clone(), is_success));
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgerule_core::Sample;

    fn workflow(expression: &str) -> Vec<Workflow> {
        serde_json::from_str(&format!(
            r#"[{{ "WorkflowName": "W",
                  "Rules": [ {{ "RuleName": "R", "Expression": "{expression}" }} ] }}]"#
        ))
        .unwrap()
    }

    fn input(id: &str, value: &str) -> EvaluableInput {
        EvaluableInput::from_sample(&Sample::new(id, value, "m1"))
    }

    #[test]
    fn range_check_holds_in_range() {
        let workflows = workflow("P1 > 10 And P1 < 100");
        let outcomes = BoundsEvaluator::new()
            .evaluate(&workflows, "W", &[input("P1", "42")])
            .unwrap();
        assert_eq!(outcomes, vec![RuleOutcome::new("R", true)]);
    }

    #[test]
    fn range_check_fails_below_lower_bound() {
        let workflows = workflow("P1 > 10 And P1 < 100");
        let outcomes = BoundsEvaluator::new()
            .evaluate(&workflows, "W", &[input("P1", "5")])
            .unwrap();
        assert!(!outcomes[0].is_success);
    }

    #[test]
    fn dotted_paths_resolve_against_slot_records() {
        let workflows = workflow("input1.Temperature > 30 And input2.Pressure < 1000");
        let inputs = vec![
            EvaluableInput::for_slot("input1", &Sample::new("Temperature", "35", "m1")),
            EvaluableInput::for_slot("input2", &Sample::new("Pressure", "900", "m1")),
        ];
        let outcomes = BoundsEvaluator::new()
            .evaluate(&workflows, "W", &inputs)
            .unwrap();
        assert!(outcomes[0].is_success);
    }

    #[test]
    fn dotted_path_requires_matching_record() {
        let workflows = workflow("input2.Temperature > 30");
        let inputs = vec![EvaluableInput::for_slot(
            "input1",
            &Sample::new("Temperature", "35", "m1"),
        )];
        assert!(matches!(
            BoundsEvaluator::new().evaluate(&workflows, "W", &inputs),
            Err(RuleError::Evaluation(_))
        ));
    }

    #[test]
    fn disabled_rules_never_succeed() {
        let workflows: Vec<Workflow> = serde_json::from_str(
            r#"[{ "WorkflowName": "W",
                  "Rules": [ { "RuleName": "R", "Expression": "P1 > 0",
                               "Enabled": false } ] }]"#,
        )
        .unwrap();
        let outcomes = BoundsEvaluator::new()
            .evaluate(&workflows, "W", &[input("P1", "42")])
            .unwrap();
        assert!(!outcomes[0].is_success);
    }

    #[test]
    fn unknown_workflow_is_a_validation_error() {
        let workflows = workflow("P1 > 0");
        assert!(matches!(
            BoundsEvaluator::new().evaluate(&workflows, "missing", &[input("P1", "1")]),
            Err(RuleError::Validation(_))
        ));
    }

    #[test]
    fn unsupported_clause_is_an_evaluation_error() {
        let workflows = workflow("P1 LIKE foo");
        assert!(matches!(
            BoundsEvaluator::new().evaluate(&workflows, "W", &[input("P1", "1")]),
            Err(RuleError::Evaluation(_))
        ));
    }

    #[test]
    fn equality_and_floats() {
        let workflows = workflow("P1 == 21.5");
        let outcomes = BoundsEvaluator::new()
            .evaluate(&workflows, "W", &[input("P1", "21.5")])
            .unwrap();
        assert!(outcomes[0].is_success);
    }
}
