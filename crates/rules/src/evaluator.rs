//! The evaluation boundary.
//!
//! Schedulers hand a workflow list and a batch of typed inputs to a
//! [`RuleEvaluator`] and get back one outcome per rule. The engine ships
//! a small numeric implementation ([`crate::BoundsEvaluator`]); anything
//! richer plugs in behind the same trait.

use std::sync::Arc;

use edgerule_core::EvaluableInput;

use crate::error::RuleError;
use crate::schema::Workflow;

/// The verdict for a single rule after one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule_name: String,
    pub is_success: bool,
}

impl RuleOutcome {
    pub fn new(rule_name: impl Into<String>, is_success: bool) -> Self {
        Self {
            rule_name: rule_name.into(),
            is_success,
        }
    }
}

/// Evaluates the rules of one workflow against a batch of inputs.
///
/// Implementations must be cheap to call on every scheduler tick and
/// must not panic on malformed expressions — return
/// [`RuleError::Evaluation`] instead so the tick can be contained.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(
        &self,
        workflows: &[Workflow],
        workflow_name: &str,
        inputs: &[EvaluableInput],
    ) -> Result<Vec<RuleOutcome>, RuleError>;
}

impl<T: RuleEvaluator + ?Sized> RuleEvaluator for Arc<T> {
    fn evaluate(
        &self,
        workflows: &[Workflow],
        workflow_name: &str,
        inputs: &[EvaluableInput],
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        (**self).evaluate(workflows, workflow_name, inputs)
    }
}
