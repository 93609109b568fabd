//! Workflow definitions, rule-file loading, the evaluator boundary, and
//! the rule-file change watcher.

pub mod bounds;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod schema;
pub mod watcher;

pub use bounds::BoundsEvaluator;
pub use error::RuleError;
pub use evaluator::{RuleEvaluator, RuleOutcome};
pub use loader::{find_rule_file, load_workflows};
pub use schema::{first_enabled_expression, Rule, Workflow};
pub use watcher::RuleFileWatcher;
