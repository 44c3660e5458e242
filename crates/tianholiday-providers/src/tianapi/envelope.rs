//! Response envelope of the tianapi endpoints.
//!
//! ```json
//! {"code": 200, "msg": "success", "result": {"list": [{ ... }]}}
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FetchError, FetchResult};
use crate::provider::FetchOutcome;
use crate::raw_record::RawHolidayRecord;

/// Envelope code signalling success.
pub const SUCCESS_CODE: i64 = 200;

/// Top-level response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiEnvelope {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub result: Option<Value>,
}

impl ApiEnvelope {
    /// Extracts the first record of `result.list`.
    ///
    /// A missing code counts as a failure. A missing `result`, missing `list`
    /// or empty `list` yields [`FetchOutcome::Empty`].
    pub fn into_outcome(self) -> FetchResult<FetchOutcome> {
        if self.code != Some(SUCCESS_CODE) {
            let msg = self
                .msg
                .unwrap_or_else(|| "missing status code in response".to_string());
            return Err(FetchError::api(self.code, msg));
        }

        let first = match self
            .result
            .and_then(|mut result| result.get_mut("list").map(Value::take))
        {
            Some(Value::Array(list)) => list.into_iter().next(),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(FetchError::invalid_response(format!(
                    "result.list is not an array: {}",
                    other
                )));
            }
        };

        match first {
            Some(entry) => serde_json::from_value::<RawHolidayRecord>(entry)
                .map(FetchOutcome::Record)
                .map_err(|e| {
                    FetchError::invalid_response(format!("failed to parse holiday record: {}", e))
                        .with_source(e)
                }),
            None => Ok(FetchOutcome::Empty),
        }
    }
}

/// Parses a response body and unwraps the envelope.
pub fn parse_envelope(body: &str) -> FetchResult<FetchOutcome> {
    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|e| {
        FetchError::invalid_response(format!("failed to parse response: {}", e)).with_source(e)
    })?;
    envelope.into_outcome()
}
