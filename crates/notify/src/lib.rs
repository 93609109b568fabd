//! Alert payloads and delivery to the notification hub.

pub mod error;
pub mod hub;
pub mod memory;
pub mod models;
pub mod traits;

pub use error::NotifyError;
pub use hub::HttpHubNotifier;
pub use memory::MemoryNotifier;
pub use models::{ComplexAlert, ParameterAlert};
pub use traits::AlertNotifier;
