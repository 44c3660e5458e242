//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tianholiday_core::{LogFormat, TracingConfig};

use crate::config::Settings;

/// tianholiday - Is today a workday, a weekend or a holiday?
#[derive(Debug, Parser)]
#[command(name = "tianholiday")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TIANHOLIDAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// tianapi key; overrides `api_key` from the config file
    #[arg(long, env = "TIANHOLIDAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the subcommand, defaulting to a one-shot text fetch.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Fetch { json: false })
    }

    /// Returns true when the sensor will run in the foreground.
    pub fn is_daemon(&self) -> bool {
        matches!(self.command, Some(Command::Run))
    }

    /// Builds the logging setup from flags and settings.
    pub fn tracing_config(&self, settings: &Settings) -> TracingConfig {
        let base = if self.debug {
            TracingConfig::cli_debug()
        } else if self.is_daemon() {
            TracingConfig::daemon()
        } else {
            TracingConfig::cli()
        };

        let mut config = base.with_format(self.log_format.unwrap_or(settings.logging.format));
        if let Some(filter) = &settings.logging.filter
            && !self.debug
        {
            config = config.with_env_filter(filter.clone());
        }
        config
    }
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the sensor in the foreground, printing each published state as JSON
    Run,

    /// Fetch today's classification once and print it
    Fetch {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
