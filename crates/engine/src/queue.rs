//! Unbounded sample queue shared between the ingestion loop and one
//! scheduler.

use std::collections::VecDeque;
use std::sync::Mutex;

use edgerule_core::Sample;

/// FIFO of samples awaiting one scheduler. Push from the ingestion loop,
/// non-blocking pop from the scheduler tick.
#[derive(Default)]
pub struct SampleQueue {
    inner: Mutex<VecDeque<Sample>>,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: Sample) {
        self.inner
            .lock()
            .expect("sample queue lock poisoned")
            .push_back(sample);
    }

    /// Take the oldest sample, if any. Never blocks on data.
    pub fn try_pop(&self) -> Option<Sample> {
        self.inner
            .lock()
            .expect("sample queue lock poisoned")
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("sample queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
