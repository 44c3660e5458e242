//! HolidaySource trait definition.
//!
//! A [`HolidaySource`] produces today's raw record. The sensor only depends
//! on this trait, so tests can script outcomes without a network.

use std::future::Future;
use std::pin::Pin;

use crate::error::{FetchError, FetchResult};
use crate::raw_record::RawHolidayRecord;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a successful request yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The first record of the result list.
    Record(RawHolidayRecord),
    /// The API succeeded but the result list was absent or empty.
    Empty,
}

impl FetchOutcome {
    /// Returns the record, turning an empty result into an error.
    pub fn into_record(self) -> FetchResult<RawHolidayRecord> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Empty => Err(FetchError::empty_result()),
        }
    }

    /// Returns true if no record was returned.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Source of the current day's holiday record.
///
/// # Example Implementation
///
/// ```ignore
/// struct Fixed(RawHolidayRecord);
///
/// impl HolidaySource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///
///     fn fetch(&self) -> BoxFuture<'_, FetchResult<FetchOutcome>> {
///         Box::pin(async move { Ok(FetchOutcome::Record(self.0.clone())) })
///     }
/// }
/// ```
pub trait HolidaySource: Send + Sync {
    /// Returns the name of this source (e.g. "tianapi").
    fn name(&self) -> &str;

    /// Performs one request for the current day.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on timeouts, transport failures, non-200
    /// statuses, API-level errors and undecodable bodies.
    fn fetch(&self) -> BoxFuture<'_, FetchResult<FetchOutcome>>;
}
