//! Client for the tianapi.com holiday endpoint.
//!
//! One GET per fetch, authenticated by the `key` query parameter. The JSON
//! envelope is unwrapped in [`envelope`] and the first record of
//! `result.list` is returned.
//!
//! # Example
//!
//! ```ignore
//! use tianholiday_providers::tianapi::{TianApiClient, TianApiConfig};
//!
//! let config = TianApiConfig::new("my-key").with_timeout(Duration::from_secs(5));
//! let client = TianApiClient::new(config)?;
//! let outcome = client.fetch_day().await?;
//! ```

mod client;
mod config;
mod envelope;

pub use client::TianApiClient;
pub use config::TianApiConfig;
pub use envelope::{ApiEnvelope, parse_envelope};
