//! Bus ingestion feeding the two scheduler queues.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use edgerule_bus::BusSubscriber;
use edgerule_core::config::BusConfig;
use edgerule_core::{EvaluableInput, Sample};

use crate::correlation::{assemble_inputs, parse_slot_bindings, CorrelationState};
use crate::queue::SampleQueue;

/// Delay between the single-queue and multi-queue pushes of one sample,
/// giving the single scheduler a consistent head start.
const QUEUE_STAGGER: Duration = Duration::from_millis(5);

/// Owns the single/multi queue pair and the correlation accumulator.
///
/// One ingestion loop writes; each scheduler reads only its own queue,
/// so a slow scheduler never stalls the other.
#[derive(Default)]
pub struct SampleFeed {
    pub(crate) single: SampleQueue,
    pub(crate) multi: SampleQueue,
    correlation: CorrelationState,
}

impl SampleFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the bus subscriber until `cancel` fires.
    ///
    /// Each cycle reconnects and resubscribes if the connection dropped,
    /// then drains every buffered sample into both queues. Errors are
    /// logged and the loop keeps going; the bus owns retry pacing via
    /// the fixed read interval.
    pub async fn run_ingest<S: BusSubscriber>(
        self: Arc<Self>,
        subscriber: S,
        config: BusConfig,
        mut cancel: watch::Receiver<bool>,
    ) {
        let read_interval = Duration::from_secs(config.data_read_interval_secs.max(1));
        info!(topic = %config.subscribe_topic, "ingestion loop started");

        loop {
            if *cancel.borrow() {
                break;
            }

            if !subscriber.is_connected() {
                if subscriber.try_connect().await {
                    match subscriber.subscribe(&config.subscribe_topic).await {
                        Ok(()) => info!(topic = %config.subscribe_topic, "subscribed to data bus"),
                        Err(e) => warn!(error = %e, "subscribe failed, will retry"),
                    }
                } else {
                    debug!("bus not reachable, will retry");
                }
            } else {
                while subscriber.has_data() {
                    let Some(sample) = subscriber.pop() else { break };
                    debug!(id = %sample.id, value = %sample.value, "sample received");
                    self.single.push(sample.clone());
                    tokio::time::sleep(QUEUE_STAGGER).await;
                    self.multi.push(sample);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(read_interval) => {}
                _ = cancel.changed() => break,
            }
        }
        info!("ingestion loop stopped");
    }

    /// Next sample for the single-parameter scheduler, wrapped as a
    /// one-field input keyed by its own parameter id.
    pub fn take_one(&self) -> Option<(EvaluableInput, Sample)> {
        let sample = self.single.try_pop()?;
        let input = EvaluableInput::from_sample(&sample);
        Some((input, sample))
    }

    /// Next correlated batch for the multi-parameter scheduler.
    ///
    /// Consumes at most one queued sample per call and feeds it to the
    /// accumulator; once `width` distinct parameters have arrived,
    /// returns the slot-named inputs (bound from `rule_expression`)
    /// together with the contributing samples in arrival order. Returns
    /// empty vectors until a batch is complete.
    pub fn take_correlated(
        &self,
        width: usize,
        rule_expression: &str,
    ) -> (Vec<EvaluableInput>, Vec<Sample>) {
        if let Some(sample) = self.multi.try_pop() {
            if let Some(batch) = self.correlation.observe(sample, width) {
                let bindings = parse_slot_bindings(rule_expression);
                let inputs = assemble_inputs(&batch, &bindings);
                return (inputs, batch);
            }
        }
        (Vec::new(), Vec::new())
    }

    /// Queue depths `(single, multi)`, for logging.
    pub fn depths(&self) -> (usize, usize) {
        (self.single.len(), self.multi.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgerule_bus::MemoryBus;

    fn bus_config() -> BusConfig {
        BusConfig {
            host: "127.0.0.1".into(),
            subscribe_port: 5560,
            publish_port: 5561,
            subscribe_topic: "datamessage".into(),
            publish_topic: "commandmessage".into(),
            data_read_interval_secs: 1,
            persist_enabled: true,
            stream_enabled: false,
            stream_length: 1000,
            command_enabled: false,
        }
    }

    #[tokio::test]
    async fn ingest_feeds_both_queues() {
        let (subscriber, _) = MemoryBus::channel();
        subscriber.inject(Sample::new("P1", "42", "m1"));

        let feed = Arc::new(SampleFeed::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&feed).run_ingest(
            subscriber,
            bus_config(),
            cancel_rx,
        ));

        // Both copies land within one poll cycle.
        let mut seen = false;
        for _ in 0..100 {
            if feed.depths() == (1, 1) {
                seen = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        cancel_tx.send_replace(true);
        handle.await.unwrap();
        assert!(seen, "sample never reached both queues");

        let (input, sample) = feed.take_one().unwrap();
        assert_eq!(input.name, "P1");
        assert_eq!(sample.value, "42");
    }

    #[tokio::test]
    async fn correlated_batch_waits_for_width() {
        let feed = SampleFeed::new();
        let expr = "input1.Temperature > 30 And input2.Pressure < 1000";

        feed.multi.push(Sample::new("Temperature", "35", "m1"));
        let (inputs, samples) = feed.take_correlated(2, expr);
        assert!(inputs.is_empty());
        assert!(samples.is_empty());

        feed.multi.push(Sample::new("Pressure", "900", "m1"));
        let (inputs, samples) = feed.take_correlated(2, expr);
        assert_eq!(inputs.len(), 2);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, "Temperature", "arrival order preserved");

        // Accumulator was cleared with the batch.
        let (inputs, _) = feed.take_correlated(2, expr);
        assert!(inputs.is_empty());
    }

    #[test]
    fn take_correlated_consumes_one_sample_per_call() {
        let feed = SampleFeed::new();
        let expr = "input1.Temperature > 30 And input2.Pressure < 1000";
        feed.multi.push(Sample::new("Temperature", "35", "m1"));
        feed.multi.push(Sample::new("Pressure", "900", "m1"));

        // A backlog is worked off one sample per call, not drained.
        let (inputs, _) = feed.take_correlated(2, expr);
        assert!(inputs.is_empty());
        assert_eq!(feed.depths().1, 1, "second sample still queued");

        let (inputs, samples) = feed.take_correlated(2, expr);
        assert_eq!(inputs.len(), 2);
        assert_eq!(samples.len(), 2);
    }
}
