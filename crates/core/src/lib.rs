//! Shared domain types and configuration for the edge rule engine.

pub mod config;
pub mod input;
pub mod sample;

pub use config::EngineConfig;
pub use input::EvaluableInput;
pub use sample::*;
