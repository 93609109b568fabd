//! The notifier boundary the dispatch path talks to.

use std::sync::Arc;

use async_trait::async_trait;

use edgerule_core::ParameterStatus;

use crate::error::NotifyError;
use crate::models::{ComplexAlert, ParameterAlert};

/// Delivers alerts and status updates to the notification hub.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// One out-of-bounds alert for one parameter.
    async fn send_alert(&self, alert: &ParameterAlert) -> Result<(), NotifyError>;

    /// A batch of parameter alerts delivered together.
    async fn send_combined_alert(&self, alerts: &[ParameterAlert]) -> Result<(), NotifyError>;

    /// Healthy / not-ok status for one parameter.
    async fn send_status(
        &self,
        parameter_name: &str,
        status: ParameterStatus,
    ) -> Result<(), NotifyError>;

    /// A correlated multi-parameter rule match.
    async fn send_complex_alert(&self, alert: &ComplexAlert) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: AlertNotifier + ?Sized> AlertNotifier for Arc<T> {
    async fn send_alert(&self, alert: &ParameterAlert) -> Result<(), NotifyError> {
        (**self).send_alert(alert).await
    }

    async fn send_combined_alert(&self, alerts: &[ParameterAlert]) -> Result<(), NotifyError> {
        (**self).send_combined_alert(alerts).await
    }

    async fn send_status(
        &self,
        parameter_name: &str,
        status: ParameterStatus,
    ) -> Result<(), NotifyError> {
        (**self).send_status(parameter_name, status).await
    }

    async fn send_complex_alert(&self, alert: &ComplexAlert) -> Result<(), NotifyError> {
        (**self).send_complex_alert(alert).await
    }
}
