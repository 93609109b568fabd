//! Scheduler lifecycle states.

use std::fmt;

/// Lifecycle of one rule executor.
///
/// `Idle → Initializing → Running → Stopping → Stopped`. A failed
/// initialization drops back to `Idle`; a stopped executor may be
/// started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Initializing,
    Running,
    Stopping,
    Stopped,
}

impl SchedulerState {
    /// States from which `start()` is legal.
    pub fn can_start(&self) -> bool {
        matches!(self, SchedulerState::Idle | SchedulerState::Stopped)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Initializing => "initializing",
            SchedulerState::Running => "running",
            SchedulerState::Stopping => "stopping",
            SchedulerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
