//! Client error types.

use thiserror::Error;

use crate::secret::SecretError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A secret reference could not be resolved.
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),

    /// The holiday API request failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] tianholiday_providers::FetchError),

    /// The sensor worker failed.
    #[error("sensor error: {0}")]
    Sensor(#[from] tianholiday_sensor::SensorError),

    /// Logging could not be initialized.
    #[error("failed to initialize logging: {0}")]
    Tracing(#[from] tianholiday_core::TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
