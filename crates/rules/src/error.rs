//! Rule loading and evaluation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rule file parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no rule file found under {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("evaluation error: {0}")]
    Evaluation(String),
}
