//! In-process bus pair for tests and single-process deployments.
//!
//! `MemoryBus` hands out a subscriber and a publisher that share plain
//! mutex-guarded buffers. Samples are injected directly; published
//! commands are recorded for inspection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use edgerule_core::{CommandMessage, Sample};

use crate::error::BusError;
use crate::traits::{BusPublisher, BusSubscriber};

/// Factory for a linked in-memory subscriber/publisher pair.
pub struct MemoryBus;

impl MemoryBus {
    pub fn channel() -> (MemoryBusSubscriber, MemoryBusPublisher) {
        (MemoryBusSubscriber::new(), MemoryBusPublisher::new())
    }
}

/// Subscriber fed by direct injection instead of a socket.
#[derive(Clone, Default)]
pub struct MemoryBusSubscriber {
    connected: Arc<AtomicBool>,
    queue: Arc<Mutex<VecDeque<Sample>>>,
}

impl MemoryBusSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a sample as if it had arrived on the bus.
    pub fn inject(&self, sample: Sample) {
        self.queue
            .lock()
            .expect("memory bus queue lock poisoned")
            .push_back(sample);
    }

    /// Simulate a dropped connection.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl BusSubscriber for MemoryBusSubscriber {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn try_connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    async fn subscribe(&self, _topic: &str) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        Ok(())
    }

    fn has_data(&self) -> bool {
        !self
            .queue
            .lock()
            .expect("memory bus queue lock poisoned")
            .is_empty()
    }

    fn pop(&self) -> Option<Sample> {
        self.queue
            .lock()
            .expect("memory bus queue lock poisoned")
            .pop_front()
    }
}

/// Publisher that records every command it is handed.
#[derive(Clone, Default)]
pub struct MemoryBusPublisher {
    published: Arc<Mutex<Vec<(CommandMessage, String)>>>,
}

impl MemoryBusPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands published so far, with their topics.
    pub fn published(&self) -> Vec<(CommandMessage, String)> {
        self.published
            .lock()
            .expect("memory bus publish lock poisoned")
            .clone()
    }
}

#[async_trait]
impl BusPublisher for MemoryBusPublisher {
    async fn publish_command(
        &self,
        command: &CommandMessage,
        topic: &str,
    ) -> Result<(), BusError> {
        self.published
            .lock()
            .expect("memory bus publish lock poisoned")
            .push((command.clone(), topic.to_string()));
        Ok(())
    }
}
