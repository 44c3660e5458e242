//! Run command: starts the sensor in the foreground.
//!
//! - Signal handler (SIGTERM/SIGINT for shutdown, SIGHUP for refresh)
//! - Holiday sensor (scheduled fetch with bounded retry)
//! - One JSON line on stdout per published state

use std::io::Write;

use tianholiday_sensor::{HolidaySensor, SensorError, SensorHandle, SensorView, SignalHandler};
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::commands::fetch::build_source;
use crate::config::Settings;
use crate::error::ClientResult;

/// Starts the sensor and blocks until a shutdown signal arrives.
pub async fn run(cli: &Cli, settings: &Settings) -> ClientResult<()> {
    let source = build_source(cli, settings)?;
    let scheduler_config = settings.scheduler_config()?;

    let signals = SignalHandler::new();
    let listener = signals.spawn_listener()?;

    info!(
        cadence = %scheduler_config.cadence,
        max_retries = scheduler_config.max_retries,
        retry_delay_secs = scheduler_config.retry_delay.as_secs(),
        "starting sensor"
    );
    let sensor = HolidaySensor::new(source, scheduler_config).start();

    let stdout = std::io::stdout();
    let result = drive(sensor, &signals, &mut stdout.lock()).await;
    listener.abort();
    result
}

/// Emits each published view to `out` until shutdown is signaled, then stops
/// the sensor.
///
/// # Errors
///
/// Fails if the sensor worker exits on its own; a panic in the worker is
/// reported as [`SensorError::Join`].
pub async fn drive<W: Write>(
    sensor: SensorHandle,
    signals: &SignalHandler,
    out: &mut W,
) -> ClientResult<()> {
    let mut views = sensor.subscribe();
    let shutdown = signals.shutdown().wait();
    tokio::pin!(shutdown);
    let refresh = signals.refresh();
    let mut worker_lost = false;

    loop {
        tokio::select! {
            biased;
            changed = views.changed() => {
                if changed.is_err() {
                    warn!("sensor stopped publishing");
                    break;
                }
                let view = views.borrow_and_update().clone();
                emit_line(out, &view)?;
            }
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = refresh.wait() => {
                info!("refresh requested");
                if let Err(e) = sensor.request_refresh().await {
                    warn!(error = %e, "refresh request failed");
                }
            }
            _ = sensor.scheduler().closed() => {
                error!("sensor worker exited unexpectedly");
                worker_lost = true;
                break;
            }
        }
    }

    sensor.shutdown().await?;
    if worker_lost {
        return Err(SensorError::SchedulerStopped.into());
    }
    Ok(())
}

/// Writes `view` as a single JSON line and flushes.
pub fn emit_line<W: Write>(out: &mut W, view: &SensorView) -> ClientResult<()> {
    serde_json::to_writer(&mut *out, view)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
