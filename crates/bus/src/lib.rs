pub mod error;
pub mod memory;
pub mod message;
pub mod traits;
pub mod transport;
pub mod zmq;

pub use error::BusError;
pub use memory::{MemoryBus, MemoryBusPublisher, MemoryBusSubscriber};
pub use message::BusMessage;
pub use traits::{BusPublisher, BusSubscriber};
pub use transport::Transport;
pub use zmq::{ZmqBusSubscriber, ZmqCommandPublisher};
