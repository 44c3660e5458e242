//! CLI, configuration and secret resolution
//!
//! This crate provides the `tianholiday` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::Settings;
pub use error::{ClientError, ClientResult};
