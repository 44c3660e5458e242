//! Holiday sensor lifecycle.
//!
//! [`HolidaySensor::start`] spawns one worker task that runs the
//! [`Scheduler`] with a sync step of fetch, normalize, publish. The returned
//! [`SensorHandle`] reads the published view and sends refresh or shutdown
//! requests.

use std::sync::Arc;

use tianholiday_providers::{FetchResult, HolidaySource, normalize_record};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{SensorError, SensorResult};
use crate::scheduler::{RefreshOutcome, Scheduler, SchedulerConfig, SchedulerHandle};
use crate::state::{SensorView, SnapshotPublisher};

/// Performs one attempt: fetch today's record, normalize it and publish it.
///
/// An empty result is reported as a [`FetchError`](tianholiday_providers::FetchError)
/// and leaves the published view untouched.
pub async fn sync_once(
    source: &dyn HolidaySource,
    publisher: &SnapshotPublisher,
) -> FetchResult<SensorView> {
    let record = source.fetch().await?.into_record()?;
    let snapshot = normalize_record(&record);
    debug!(
        source = source.name(),
        date = %snapshot.date,
        state = snapshot.state(),
        "normalized holiday record"
    );
    Ok(publisher.publish(snapshot))
}

/// A not-yet-started sensor.
pub struct HolidaySensor {
    source: Arc<dyn HolidaySource>,
    config: SchedulerConfig,
}

impl HolidaySensor {
    /// Creates a sensor over `source`.
    pub fn new(source: Arc<dyn HolidaySource>, config: SchedulerConfig) -> Self {
        Self { source, config }
    }

    /// Spawns the worker and returns its handle. Must be called within a
    /// Tokio runtime.
    pub fn start(self) -> SensorHandle {
        let publisher = SnapshotPublisher::new();
        let scheduler = Scheduler::new(self.config);
        let scheduler_handle = scheduler.handle();

        info!(source = self.source.name(), "starting holiday sensor");

        let source = self.source;
        let sync_publisher = publisher.clone();
        let task = tokio::spawn(scheduler.run(move || {
            let source = Arc::clone(&source);
            let publisher = sync_publisher.clone();
            async move { sync_once(source.as_ref(), &publisher).await.map(|_| ()) }
        }));

        SensorHandle {
            publisher,
            scheduler: scheduler_handle,
            task: Some(task),
        }
    }
}

/// Handle to a running sensor. Dropping it aborts the worker.
pub struct SensorHandle {
    publisher: SnapshotPublisher,
    scheduler: SchedulerHandle,
    task: Option<JoinHandle<()>>,
}

impl SensorHandle {
    /// The latest published view.
    pub fn view(&self) -> SensorView {
        self.publisher.current()
    }

    /// The primary state (`"unknown"` before any data).
    pub fn state(&self) -> String {
        self.view().state().to_string()
    }

    /// Subscribes to published views.
    pub fn subscribe(&self) -> watch::Receiver<SensorView> {
        self.publisher.subscribe()
    }

    /// Requests a fetch and waits for its outcome.
    pub async fn refresh(&self) -> SensorResult<RefreshOutcome> {
        self.scheduler.refresh().await
    }

    /// Requests a fetch without waiting.
    pub async fn request_refresh(&self) -> SensorResult<()> {
        self.scheduler.request_refresh().await
    }

    /// The scheduler handle, for state inspection.
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    /// Stops the worker, cancelling timers and any in-flight fetch, and waits
    /// for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Join`] if the worker panicked.
    pub async fn shutdown(mut self) -> SensorResult<()> {
        match self.scheduler.stop().await {
            Ok(()) | Err(SensorError::SchedulerStopped) => {}
            Err(e) => return Err(e),
        }
        if let Some(task) = self.task.take() {
            task.await?;
        }
        info!("holiday sensor stopped");
        Ok(())
    }
}

impl Drop for SensorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
