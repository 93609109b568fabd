//! Notification error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("hub returned status {status}: {body}")]
    HubStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}
