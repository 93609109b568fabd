//! The storage trait the dispatch path writes through.

use std::sync::Arc;

use async_trait::async_trait;

use edgerule_core::Sample;

use crate::error::StoreError;

/// Key/value persistence plus capped sample streams.
///
/// Evaluation results are written as opaque record strings keyed by
/// parameter id or rule name; raw samples can additionally be appended
/// to a bounded stream per parameter for short-horizon history.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Write (or overwrite) the record stored under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the record stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Append a sample to the stream under `key`, evicting the oldest
    /// entry once the stream holds `cap` samples.
    async fn append_to_stream(
        &self,
        key: &str,
        cap: usize,
        sample: &Sample,
    ) -> Result<(), StoreError>;

    /// Read up to `count` samples from the stream under `key`, newest
    /// first. An unknown key reads as empty.
    async fn read_stream(&self, key: &str, count: usize) -> Result<Vec<Sample>, StoreError>;
}

#[async_trait]
impl<T: DurableStore + ?Sized> DurableStore for Arc<T> {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn append_to_stream(
        &self,
        key: &str,
        cap: usize,
        sample: &Sample,
    ) -> Result<(), StoreError> {
        (**self).append_to_stream(key, cap, sample).await
    }

    async fn read_stream(&self, key: &str, count: usize) -> Result<Vec<Sample>, StoreError> {
        (**self).read_stream(key, count).await
    }
}
