//! Sensor error types.

use std::io;
use thiserror::Error;

/// Result type for sensor lifecycle operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors raised by the sensor lifecycle, never by individual fetches.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The scheduler task has exited and no longer accepts commands.
    #[error("scheduler is not running")]
    SchedulerStopped,

    /// The scheduler task panicked or was aborted.
    #[error("sensor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A Unix signal handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}
