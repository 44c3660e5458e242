//! HTTP client for the holiday endpoint.

use tracing::{debug, warn};

use super::config::TianApiConfig;
use super::envelope::parse_envelope;
use crate::error::{FetchError, FetchResult};
use crate::provider::{BoxFuture, FetchOutcome, HolidaySource};

/// tianapi holiday client.
#[derive(Debug)]
pub struct TianApiClient {
    http_client: reqwest::Client,
    config: TianApiConfig,
}

impl TianApiClient {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the API key is empty, the base URL is invalid, or the HTTP
    /// client cannot be built.
    pub fn new(config: TianApiConfig) -> FetchResult<Self> {
        if !config.has_api_key() {
            return Err(FetchError::configuration("tianapi key is empty"));
        }
        config.endpoint().map_err(|e| {
            FetchError::configuration(format!("invalid base URL {}: {}", config.base_url, e))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                FetchError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TianApiConfig {
        &self.config
    }

    /// Requests the current day's record.
    pub async fn fetch_day(&self) -> FetchResult<FetchOutcome> {
        let url = self.config.request_url().map_err(|e| {
            FetchError::configuration(format!("invalid request URL: {}", e))
        })?;
        debug!(endpoint = %self.config.base_url, path = TianApiConfig::ENDPOINT_PATH, "requesting holiday record");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "holiday endpoint returned an error status");
            debug!(body = body_excerpt(&body), "error status body");
            return Err(FetchError::http_status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        let outcome = parse_envelope(&body)?;
        if outcome.is_empty() {
            debug!("holiday endpoint returned an empty list");
        }
        Ok(outcome)
    }
}

/// Longest body prefix logged for an error status.
const BODY_EXCERPT_LEN: usize = 256;

/// Cuts `body` to at most [`BODY_EXCERPT_LEN`] bytes on a char boundary.
fn body_excerpt(body: &str) -> &str {
    if body.len() <= BODY_EXCERPT_LEN {
        return body;
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    // Strip the URL, it carries the key.
    let e = e.without_url();
    if e.is_timeout() {
        FetchError::timeout("request timeout").with_source(e)
    } else if e.is_connect() {
        FetchError::network(format!("connection failed: {}", e)).with_source(e)
    } else {
        FetchError::network(format!("request failed: {}", e)).with_source(e)
    }
}

impl HolidaySource for TianApiClient {
    fn name(&self) -> &str {
        "tianapi"
    }

    fn fetch(&self) -> BoxFuture<'_, FetchResult<FetchOutcome>> {
        Box::pin(self.fetch_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorCode;
    use std::time::Duration;
    use tianholiday_core::AttributeValue;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OK_BODY: &str = r#"{
        "code": 200,
        "msg": "success",
        "result": {"list": [{
            "date": "2024-10-01",
            "daycode": 1,
            "weekday": 2,
            "name": "国庆节",
            "enname": "National Day",
            "vacation": ["2024-10-01", "2024-10-02"],
            "wage": 3
        }]}
    }"#;

    fn client_for(server: &MockServer) -> TianApiClient {
        let config = TianApiConfig::new("test-key")
            .with_base_url(server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        TianApiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn fetches_first_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jiejiari/index"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let record = client.fetch().await.unwrap().into_record().unwrap();
        assert_eq!(record.date.as_deref(), Some("2024-10-01"));
        assert_eq!(record.daycode, Some(AttributeValue::Integer(1)));
        assert_eq!(record.vacation.unwrap().len(), 2);
    }

    #[test]
    fn error_body_excerpt_is_bounded() {
        assert_eq!(body_excerpt("boom"), "boom");

        let long = "x".repeat(BODY_EXCERPT_LEN * 4);
        assert_eq!(body_excerpt(&long).len(), BODY_EXCERPT_LEN);

        // Multi-byte text is cut on a char boundary.
        let wide = "节".repeat(BODY_EXCERPT_LEN);
        let excerpt = body_excerpt(&wide);
        assert!(excerpt.len() <= BODY_EXCERPT_LEN);
        assert!(excerpt.chars().all(|c| c == '节'));
    }

    #[tokio::test]
    async fn server_error_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(path("/jiejiari/index"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_day().await.unwrap_err();
        assert_eq!(err.code(), FetchErrorCode::HttpStatus);
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn non_200_success_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(path("/jiejiari/index"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_day().await.unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn envelope_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/jiejiari/index"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"code":230,"msg":"key错误或为空"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_day().await.unwrap_err();
        assert_eq!(err.code(), FetchErrorCode::ApiError);
        assert_eq!(err.message(), "key错误或为空");
        assert_eq!(err.api_code(), Some(230));
    }

    #[tokio::test]
    async fn empty_list_is_empty_outcome() {
        let server = MockServer::start().await;
        Mock::given(path("/jiejiari/index"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"code":200,"msg":"success","result":{"list":[]}}"#),
            )
            .mount(&server)
            .await;

        let outcome = client_for(&server).fetch_day().await.unwrap();
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/jiejiari/index"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(OK_BODY)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = TianApiConfig::new("test-key")
            .with_base_url(server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        let err = TianApiClient::new(config)
            .unwrap()
            .fetch_day()
            .await
            .unwrap_err();
        assert_eq!(err.code(), FetchErrorCode::Timeout);
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let config = TianApiConfig::new("test-key").with_base_url(uri).unwrap();
        let err = TianApiClient::new(config)
            .unwrap()
            .fetch_day()
            .await
            .unwrap_err();
        assert_eq!(err.code(), FetchErrorCode::Network);
        assert!(!err.to_string().contains("test-key"));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = TianApiClient::new(TianApiConfig::new("")).unwrap_err();
        assert_eq!(err.code(), FetchErrorCode::Configuration);
    }

    #[test]
    fn client_reports_name() {
        let client = TianApiClient::new(TianApiConfig::new("k")).unwrap();
        assert_eq!(client.name(), "tianapi");
    }
}
