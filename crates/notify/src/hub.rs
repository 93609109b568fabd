//! HTTP client for the notification hub.
//!
//! Posts each alert kind as JSON to its own hub route. Delivery gets a
//! single retry after a randomized delay (0–5 s), mirroring the hub's
//! own reconnect backoff; anything beyond that is the caller's problem,
//! and callers log and drop.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use edgerule_core::ParameterStatus;

use crate::error::NotifyError;
use crate::models::{ComplexAlert, ParameterAlert};
use crate::traits::AlertNotifier;

pub struct HttpHubNotifier {
    base_url: String,
    client: reqwest::Client,
}

impl HttpHubNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        route: &str,
        payload: &T,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/{route}", self.base_url);
        match self.try_post(&url, payload).await {
            Ok(()) => Ok(()),
            Err(first) => {
                let delay = Duration::from_secs(rand::thread_rng().gen_range(0..=5));
                warn!(
                    url = %url,
                    error = %first,
                    retry_in_secs = delay.as_secs(),
                    "hub delivery failed, retrying once"
                );
                tokio::time::sleep(delay).await;
                self.try_post(&url, payload).await
            }
        }
    }

    async fn try_post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::HubStatus { status, body });
        }
        debug!(url, "hub delivery ok");
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlertNotifier for HttpHubNotifier {
    async fn send_alert(&self, alert: &ParameterAlert) -> Result<(), NotifyError> {
        self.post_json("api/alert", alert).await
    }

    async fn send_combined_alert(&self, alerts: &[ParameterAlert]) -> Result<(), NotifyError> {
        self.post_json("api/combined-alert", alerts).await
    }

    async fn send_status(
        &self,
        parameter_name: &str,
        status: ParameterStatus,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "ParameterName": parameter_name,
            "Status": status.as_str(),
        });
        self.post_json("api/status", &payload).await
    }

    async fn send_complex_alert(&self, alert: &ComplexAlert) -> Result<(), NotifyError> {
        self.post_json("api/complex-alert", alert).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let hub = HttpHubNotifier::new("http://localhost:5000/");
        assert_eq!(hub.base_url(), "http://localhost:5000");
    }
}
