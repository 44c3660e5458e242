//! tianapi client configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

/// Configuration for [`TianApiClient`](super::TianApiClient).
#[derive(Clone)]
pub struct TianApiConfig {
    /// API root; the endpoint path is joined onto it.
    pub base_url: String,

    /// Account key sent as the `key` query parameter.
    pub api_key: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl TianApiConfig {
    /// Public API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://apis.tianapi.com/";

    /// Path of the holiday endpoint, relative to the base URL.
    pub const ENDPOINT_PATH: &'static str = "jiejiari/index";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a configuration for the public API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("tianholiday/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Points the client at another API root.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` does not parse or cannot carry a path.
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let mut raw = url.as_ref().trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let parsed = Url::parse(&raw)?;
        if parsed.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        self.base_url = raw;
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the endpoint URL without credentials, suitable for logging.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(Self::ENDPOINT_PATH)
    }

    /// Returns the full request URL, including the key.
    pub fn request_url(&self) -> Result<Url, url::ParseError> {
        let mut url = self.endpoint()?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Returns true if an API key is set.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for TianApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TianApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let config = TianApiConfig::new("abc");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://apis.tianapi.com/jiejiari/index"
        );
        assert_eq!(
            config.request_url().unwrap().as_str(),
            "https://apis.tianapi.com/jiejiari/index?key=abc"
        );
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("tianholiday/"));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = TianApiConfig::new("abc")
            .with_base_url("http://127.0.0.1:8080/mock")
            .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080/mock/");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "http://127.0.0.1:8080/mock/jiejiari/index"
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(TianApiConfig::new("abc").with_base_url("not a url").is_err());
        assert!(TianApiConfig::new("abc").with_base_url("mailto:x@y").is_err());
    }

    #[test]
    fn key_is_encoded() {
        let config = TianApiConfig::new("a b&c");
        assert_eq!(
            config.request_url().unwrap().query(),
            Some("key=a+b%26c")
        );
    }

    #[test]
    fn debug_redacts_key() {
        let config = TianApiConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn has_api_key() {
        assert!(TianApiConfig::new("abc").has_api_key());
        assert!(!TianApiConfig::new("  ").has_api_key());
    }
}
