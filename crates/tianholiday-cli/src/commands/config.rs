//! Configuration commands.

use std::path::Path;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::{ClientError, ClientResult};

/// Renders the configuration as TOML with a header naming its file.
/// A literal `api_key` is masked.
pub fn render_dump(settings: &Settings, path: &Path) -> ClientResult<String> {
    let toml_str = toml::to_string_pretty(&settings.redacted())
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))?;
    Ok(format!("# config.toml ({})\n{}", path.display(), toml_str))
}

/// Dump the current configuration to stdout.
pub fn dump(cli: &Cli, settings: &Settings) -> ClientResult<()> {
    println!("{}", render_dump(settings, &config_path(cli))?);
    Ok(())
}

/// Validate the configuration, including the API key reference.
pub fn validate(cli: &Cli, settings: &Settings) -> ClientResult<()> {
    settings.validate()?;
    settings.resolve_api_key(cli.api_key.as_deref())?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(cli: &Cli) -> ClientResult<()> {
    println!("config: {}", config_path(cli).display());
    Ok(())
}

fn config_path(cli: &Cli) -> std::path::PathBuf {
    cli.config.clone().unwrap_or_else(Settings::default_path)
}
