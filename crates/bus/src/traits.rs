use std::sync::Arc;

use async_trait::async_trait;

use edgerule_core::{CommandMessage, Sample};

use crate::error::BusError;

/// Consumes telemetry samples from the data bus.
///
/// The ingestion loop drives this interface with a poll cycle: check
/// `is_connected`/`try_connect`, `subscribe` once, then `has_data` +
/// `pop` each cycle. `pop` must never block.
#[async_trait]
pub trait BusSubscriber: Send + Sync {
    /// Whether the underlying connection is currently up.
    fn is_connected(&self) -> bool;

    /// Attempt to (re)establish the connection. Returns success.
    async fn try_connect(&self) -> bool;

    /// Subscribe to a sample topic. Safe to call again after a reconnect.
    async fn subscribe(&self, topic: &str) -> Result<(), BusError>;

    /// Whether a sample is waiting to be popped.
    fn has_data(&self) -> bool;

    /// Take the next buffered sample, if any. Never blocks.
    fn pop(&self) -> Option<Sample>;
}

/// Blanket implementation so `Arc<dyn BusSubscriber>` can be used directly.
#[async_trait]
impl<T: BusSubscriber + ?Sized> BusSubscriber for Arc<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn try_connect(&self) -> bool {
        (**self).try_connect().await
    }

    async fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        (**self).subscribe(topic).await
    }

    fn has_data(&self) -> bool {
        (**self).has_data()
    }

    fn pop(&self) -> Option<Sample> {
        (**self).pop()
    }
}

/// Publishes command messages back onto the data bus.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    /// Publish a command on the given topic.
    async fn publish_command(&self, command: &CommandMessage, topic: &str)
        -> Result<(), BusError>;
}

/// Blanket implementation so `Arc<dyn BusPublisher>` can be used directly.
#[async_trait]
impl<T: BusPublisher + ?Sized> BusPublisher for Arc<T> {
    async fn publish_command(
        &self,
        command: &CommandMessage,
        topic: &str,
    ) -> Result<(), BusError> {
        (**self).publish_command(command, topic).await
    }
}
