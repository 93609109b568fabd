//! In-memory store, used when no external database is reachable and in
//! tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::trace;

use edgerule_core::Sample;

use crate::error::StoreError;
use crate::traits::DurableStore;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
    streams: Mutex<HashMap<String, VecDeque<Sample>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct record keys held.
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("records lock poisoned").len()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        trace!(key, "store put");
        self.records
            .lock()
            .expect("records lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("records lock poisoned")
            .get(key)
            .cloned())
    }

    async fn append_to_stream(
        &self,
        key: &str,
        cap: usize,
        sample: &Sample,
    ) -> Result<(), StoreError> {
        let mut streams = self.streams.lock().expect("streams lock poisoned");
        let stream = streams.entry(key.to_string()).or_default();
        while stream.len() >= cap.max(1) {
            stream.pop_front();
        }
        stream.push_back(sample.clone());
        Ok(())
    }

    async fn read_stream(&self, key: &str, count: usize) -> Result<Vec<Sample>, StoreError> {
        let streams = self.streams.lock().expect("streams lock poisoned");
        Ok(streams
            .get(key)
            .map(|stream| stream.iter().rev().take(count).cloned().collect())
            .unwrap_or_default())
    }
}
