//! Recording notifier, used when no hub is configured and in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use edgerule_core::ParameterStatus;

use crate::error::NotifyError;
use crate::models::{ComplexAlert, ParameterAlert};
use crate::traits::AlertNotifier;

#[derive(Default)]
pub struct MemoryNotifier {
    alerts: Mutex<Vec<ParameterAlert>>,
    statuses: Mutex<Vec<(String, ParameterStatus)>>,
    complex_alerts: Mutex<Vec<ComplexAlert>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<ParameterAlert> {
        self.alerts.lock().expect("alerts lock poisoned").clone()
    }

    pub fn statuses(&self) -> Vec<(String, ParameterStatus)> {
        self.statuses.lock().expect("statuses lock poisoned").clone()
    }

    pub fn complex_alerts(&self) -> Vec<ComplexAlert> {
        self.complex_alerts
            .lock()
            .expect("complex_alerts lock poisoned")
            .clone()
    }
}

#[async_trait]
impl AlertNotifier for MemoryNotifier {
    async fn send_alert(&self, alert: &ParameterAlert) -> Result<(), NotifyError> {
        debug!(parameter = %alert.parameter_name, "recorded alert");
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .push(alert.clone());
        Ok(())
    }

    async fn send_combined_alert(&self, alerts: &[ParameterAlert]) -> Result<(), NotifyError> {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .extend_from_slice(alerts);
        Ok(())
    }

    async fn send_status(
        &self,
        parameter_name: &str,
        status: ParameterStatus,
    ) -> Result<(), NotifyError> {
        self.statuses
            .lock()
            .expect("statuses lock poisoned")
            .push((parameter_name.to_string(), status));
        Ok(())
    }

    async fn send_complex_alert(&self, alert: &ComplexAlert) -> Result<(), NotifyError> {
        self.complex_alerts
            .lock()
            .expect("complex_alerts lock poisoned")
            .push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_everything_sent() {
        let notifier = MemoryNotifier::new();
        notifier
            .send_status("P1", ParameterStatus::NotOk)
            .await
            .unwrap();
        notifier
            .send_alert(&ParameterAlert {
                parameter_name: "P1".into(),
                has_alert: true,
                value: "42".into(),
                time: "t".into(),
                low_limit: String::new(),
                high_limit: String::new(),
                message: "P1 Not Ok".into(),
            })
            .await
            .unwrap();

        assert_eq!(notifier.statuses(), vec![("P1".into(), ParameterStatus::NotOk)]);
        assert_eq!(notifier.alerts().len(), 1);
    }
}
