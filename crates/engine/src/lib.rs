//! The rule engine proper: sample queues, ingestion, correlation, the
//! two rule schedulers, and dispatch of matches to the store, the
//! notification hub, and the command bus.

pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod multi;
pub mod queue;
pub mod single;
pub mod state;

pub use correlation::{parse_slot_bindings, CorrelationState};
pub use dispatch::Dispatcher;
pub use error::EngineError;
pub use feed::SampleFeed;
pub use multi::MultiParamExecutor;
pub use queue::SampleQueue;
pub use single::SingleParamExecutor;
pub use state::SchedulerState;
