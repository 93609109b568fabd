//! Fan-out of rule matches to the store, the notification hub, and the
//! command bus.
//!
//! Every delivery failure here is terminal for that delivery only: it is
//! logged with context and swallowed, so a dead hub or store can never
//! stall a scheduler tick.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use edgerule_bus::BusPublisher;
use edgerule_core::config::BusConfig;
use edgerule_core::{
    CommandMessage, ParameterStatus, Sample, RECORD_SEPARATOR, VALUE_SEPARATOR,
};
use edgerule_notify::{AlertNotifier, ComplexAlert, ParameterAlert};
use edgerule_store::DurableStore;

/// Pull the low/high limits out of a bounds expression.
///
/// Splits on runs of non-digit characters and takes the first two
/// numbers. Expressions without numeric bounds yield blank limits; this
/// is cosmetic data for the alert payload, never an error.
pub fn extract_bounds(expression: &str) -> (String, String) {
    static SPLIT: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let split = SPLIT.get_or_init(|| Regex::new(r"\D+").expect("bounds split regex is valid"));
    let numbers: Vec<&str> = split.split(expression).collect();
    let low = numbers.get(1).copied().unwrap_or("").to_string();
    let high = numbers.get(2).copied().unwrap_or("").to_string();
    (low, high)
}

/// Delivery targets and flags shared by both schedulers.
pub struct Dispatcher {
    notifier: Arc<dyn AlertNotifier>,
    store: Arc<dyn DurableStore>,
    publisher: Arc<dyn BusPublisher>,
    persist_enabled: bool,
    stream_enabled: bool,
    stream_length: usize,
    command_enabled: bool,
    publish_topic: String,
}

impl Dispatcher {
    pub fn new(
        notifier: Arc<dyn AlertNotifier>,
        store: Arc<dyn DurableStore>,
        publisher: Arc<dyn BusPublisher>,
        bus: &BusConfig,
    ) -> Self {
        Self {
            notifier,
            store,
            publisher,
            persist_enabled: bus.persist_enabled,
            stream_enabled: bus.stream_enabled,
            stream_length: bus.stream_length,
            command_enabled: bus.command_enabled,
            publish_topic: bus.publish_topic.clone(),
        }
    }

    /// A single-parameter rule matched: the sample is out of bounds.
    pub async fn single_match(&self, sample: &Sample, expression: &str) {
        let (low, high) = extract_bounds(expression);
        let alert = ParameterAlert {
            parameter_name: sample.id.clone(),
            has_alert: true,
            value: sample.value.clone(),
            time: sample.time.to_rfc3339(),
            low_limit: low,
            high_limit: high,
            message: format!("{} Not Ok", sample.id),
        };

        if let Err(e) = self
            .notifier
            .send_status(&sample.id, ParameterStatus::NotOk)
            .await
        {
            warn!(parameter = %sample.id, error = %e, "status delivery failed");
        }
        if let Err(e) = self.notifier.send_alert(&alert).await {
            warn!(parameter = %sample.id, error = %e, "alert delivery failed");
        }

        if self.persist_enabled {
            let record = format!(
                "{}{sep}{}{sep}{}",
                sample.value,
                expression,
                sample.time.to_rfc3339(),
                sep = RECORD_SEPARATOR,
            );
            if let Err(e) = self.store.put(&sample.id, &record).await {
                warn!(parameter = %sample.id, error = %e, "persist failed");
            }
            if self.stream_enabled {
                if let Err(e) = self
                    .store
                    .append_to_stream(&sample.id, self.stream_length, sample)
                    .await
                {
                    warn!(parameter = %sample.id, error = %e, "stream append failed");
                }
            }
        }

        if self.command_enabled {
            let command = CommandMessage::nok_for(sample);
            if let Err(e) = self
                .publisher
                .publish_command(&command, &self.publish_topic)
                .await
            {
                warn!(parameter = %sample.id, error = %e, "command publish failed");
            }
        }
    }

    /// A single-parameter rule did not match: report the parameter healthy.
    pub async fn healthy(&self, sample: &Sample) {
        debug!(parameter = %sample.id, "parameter healthy");
        if let Err(e) = self
            .notifier
            .send_status(&sample.id, ParameterStatus::Healthy)
            .await
        {
            warn!(parameter = %sample.id, error = %e, "status delivery failed");
        }
    }

    /// A correlated multi-parameter rule matched over `samples`.
    ///
    /// The alert carries the last contributing sample's time; the
    /// persisted record carries the first's, with the expression
    /// repeated at both ends of the record.
    pub async fn multi_match(&self, samples: &[Sample], rule_name: &str, expression: &str) {
        let Some(first) = samples.first() else { return };
        let Some(last) = samples.last() else { return };

        let values = samples
            .iter()
            .map(|s| s.value.as_str())
            .collect::<Vec<_>>()
            .join(VALUE_SEPARATOR);

        let alert = ComplexAlert {
            has_alert: true,
            rule_name: rule_name.to_string(),
            rule: expression.to_string(),
            parameter_and_values: values.clone(),
            time: last.time.to_rfc3339(),
        };
        if let Err(e) = self.notifier.send_complex_alert(&alert).await {
            warn!(rule = %rule_name, error = %e, "complex alert delivery failed");
        }

        if self.persist_enabled {
            let record = format!(
                "{values}{sep}{expression}{sep}{}{sep}{expression}",
                first.time.to_rfc3339(),
                sep = RECORD_SEPARATOR,
            );
            if let Err(e) = self.store.put(rule_name, &record).await {
                warn!(rule = %rule_name, error = %e, "persist failed");
            }
        }
    }
}
