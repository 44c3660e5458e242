//! Error types for holiday data fetches.
//!
//! Every failure a [`HolidaySource`](crate::HolidaySource) can report is a
//! [`FetchError`]. The scheduler treats all categories the same way (log,
//! count against the retry budget), but the category is kept so logs and
//! callers can tell a bad key from a flaky network.

use std::fmt;
use thiserror::Error;

/// The category of a fetch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorCode {
    /// The request or response did not complete within the timeout.
    Timeout,
    /// Connection or transport failure.
    Network,
    /// The server answered with a status other than 200.
    HttpStatus,
    /// The API envelope carried a non-success code.
    ApiError,
    /// The API succeeded but returned no record.
    EmptyResult,
    /// The response body could not be decoded.
    InvalidResponse,
    /// Missing or invalid client configuration.
    Configuration,
}

impl FetchErrorCode {
    /// Returns true for failures that carry no data but are not faults.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network_error",
            Self::HttpStatus => "http_status",
            Self::ApiError => "api_error",
            Self::EmptyResult => "empty_result",
            Self::InvalidResponse => "invalid_response",
            Self::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching holiday data.
#[derive(Debug, Error)]
pub struct FetchError {
    code: FetchErrorCode,
    message: String,
    /// HTTP status, for [`FetchErrorCode::HttpStatus`].
    status: Option<u16>,
    /// Envelope code, for [`FetchErrorCode::ApiError`].
    api_code: Option<i64>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FetchError {
    /// Creates a new fetch error with the given code and message.
    pub fn new(code: FetchErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            api_code: None,
            source: None,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::Timeout, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::Network, message)
    }

    /// Creates an error for an unexpected HTTP status.
    pub fn http_status(status: u16) -> Self {
        let mut err = Self::new(
            FetchErrorCode::HttpStatus,
            format!("unexpected HTTP status {}", status),
        );
        err.status = Some(status);
        err
    }

    /// Creates an error for a failure reported inside the API envelope.
    ///
    /// `message` is the envelope's `msg` verbatim.
    pub fn api(api_code: Option<i64>, message: impl Into<String>) -> Self {
        let mut err = Self::new(FetchErrorCode::ApiError, message);
        err.api_code = api_code;
        err
    }

    /// Creates an empty-result error.
    pub fn empty_result() -> Self {
        Self::new(FetchErrorCode::EmptyResult, "API returned no holiday record")
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FetchErrorCode::Configuration, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> FetchErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if this is an HTTP status error.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the API envelope code, if this is an API error.
    pub fn api_code(&self) -> Option<i64> {
        self.api_code
    }

    /// Returns true if this is a soft failure (no data, nothing broken).
    pub fn is_soft(&self) -> bool {
        self.code.is_soft()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(code) = self.api_code {
            write!(f, " (code {})", code)?;
        }
        Ok(())
    }
}

/// A specialized Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
