//! HolidaySource trait, tianapi client and record normalization.
//!
//! ```text
//! ┌─────────────────────┐
//! │  apis.tianapi.com   │
//! └──────────┬──────────┘
//!            │  GET /jiejiari/index?key=…
//!            ▼
//! ┌─────────────────────┐
//! │   TianApiClient     │  HolidaySource
//! └──────────┬──────────┘
//!            │  FetchOutcome::Record
//!            ▼
//!    ┌──────────────────┐
//!    │ RawHolidayRecord │
//!    └────────┬─────────┘
//!             │  normalize_record()
//!             ▼
//!  ┌────────────────────┐
//!  │ NormalizedSnapshot │
//!  └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tianholiday_providers::{HolidaySource, normalize_record};
//! use tianholiday_providers::tianapi::{TianApiClient, TianApiConfig};
//!
//! let client = TianApiClient::new(TianApiConfig::new("my-key"))?;
//! let record = client.fetch().await?.into_record()?;
//! let snapshot = normalize_record(&record);
//! println!("{}", snapshot.state());
//! ```

pub mod error;
pub mod normalize;
pub mod provider;
pub mod raw_record;
#[cfg(feature = "tianapi")]
pub mod tianapi;

pub use error::{FetchError, FetchErrorCode, FetchResult};
pub use normalize::normalize_record;
pub use provider::{BoxFuture, FetchOutcome, HolidaySource};
pub use raw_record::RawHolidayRecord;
