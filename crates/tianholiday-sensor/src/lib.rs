//! Holiday sensor: scheduled fetching with bounded retry and state
//! publication.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tianholiday_providers::tianapi::{TianApiClient, TianApiConfig};
//! use tianholiday_sensor::{HolidaySensor, SchedulerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TianApiClient::new(TianApiConfig::new("my-key"))?;
//!     let sensor = HolidaySensor::new(Arc::new(client), SchedulerConfig::default()).start();
//!
//!     let mut views = sensor.subscribe();
//!     views.changed().await?;
//!     println!("today is a {}", sensor.state());
//!
//!     sensor.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod cadence;
mod error;
mod scheduler;
mod sensor;
mod signals;
mod state;

pub use cadence::{Cadence, MIN_INTERVAL, next_daily_fire};
pub use error::{SensorError, SensorResult};
pub use scheduler::{
    RefreshOutcome, RetryDecision, Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle,
    SchedulerPhase, SchedulerState, SharedSchedulerState, Trigger, new_scheduler_state,
};
pub use sensor::{HolidaySensor, SensorHandle, sync_once};
pub use signals::{RefreshSignal, ShutdownSignal, SignalHandler};
pub use state::{
    PublishedSnapshot, SensorView, SnapshotPublisher, UNKNOWN_STATE, UPDATE_TIME_FORMAT,
    UPDATE_TIME_KEY,
};
