//! One-shot fetch: request today's record, print the sensor view, exit.

use std::io::Write;
use std::sync::Arc;

use tianholiday_providers::HolidaySource;
use tianholiday_providers::tianapi::TianApiClient;
use tianholiday_sensor::{SensorView, SnapshotPublisher, sync_once};
use tracing::info;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::ClientResult;

/// Builds the tianapi client from flags and settings.
pub fn build_source(cli: &Cli, settings: &Settings) -> ClientResult<Arc<dyn HolidaySource>> {
    let api_key = settings.resolve_api_key(cli.api_key.as_deref())?;
    let client = TianApiClient::new(settings.api_config(api_key)?)?;
    Ok(Arc::new(client))
}

/// Fetches once and returns the resulting view. No retries.
pub async fn fetch_view(source: &dyn HolidaySource) -> ClientResult<SensorView> {
    let publisher = SnapshotPublisher::new();
    let view = sync_once(source, &publisher).await?;
    info!(state = view.state(), "fetched holiday record");
    Ok(view)
}

/// Runs the `fetch` command.
pub async fn run(cli: &Cli, settings: &Settings, json: bool) -> ClientResult<()> {
    let source = build_source(cli, settings)?;
    let view = fetch_view(source.as_ref()).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &view)?;
        writeln!(out)?;
    } else {
        render_text(&mut out, &view)?;
    }
    Ok(())
}

/// Writes the state line followed by one `key: value` line per attribute.
pub fn render_text<W: Write>(out: &mut W, view: &SensorView) -> std::io::Result<()> {
    writeln!(out, "state: {}", view.state())?;
    for (key, value) in view.attributes().iter() {
        writeln!(out, "{}: {}", key, value)?;
    }
    Ok(())
}
