//! Durable storage boundary for evaluation results and sample streams.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::DurableStore;
