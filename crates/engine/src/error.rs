//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bus error: {0}")]
    Bus(#[from] edgerule_bus::BusError),

    #[error("rule error: {0}")]
    Rule(#[from] edgerule_rules::RuleError),

    #[error("store error: {0}")]
    Store(#[from] edgerule_store::StoreError),

    #[error("notify error: {0}")]
    Notify(#[from] edgerule_notify::NotifyError),

    #[error("scheduler is {0}, cannot start")]
    InvalidState(crate::state::SchedulerState),
}
