//! tianholiday CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use tianholiday_cli::cli::{Cli, Command, ConfigAction};
use tianholiday_cli::commands;
use tianholiday_cli::config::Settings;
use tianholiday_cli::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    tianholiday_core::init_tracing(cli.tracing_config(&settings))?;

    match cli.command() {
        Command::Run => commands::run::run(&cli, &settings).await,
        Command::Fetch { json } => commands::fetch::run(&cli, &settings, json).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&cli, &settings),
            ConfigAction::Validate => commands::config::validate(&cli, &settings),
            ConfigAction::Path => commands::config::path(&cli),
        },
    }
}
