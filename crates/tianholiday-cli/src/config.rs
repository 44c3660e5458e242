//! Client configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/tianholiday/config.toml`:
//!
//! ```toml
//! api_key = "env::TIANAPI_KEY"
//!
//! [api]
//! timeout_secs = 10
//!
//! [schedule]
//! cadence = "daily"
//! daily_at = "00:01"
//! max_retries = 2
//! retry_delay_secs = 300
//!
//! [logging]
//! format = "compact"
//! ```
//!
//! `api_key` supports secret references (see [`crate::secret`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tianholiday_core::LogFormat;
use tianholiday_providers::tianapi::TianApiConfig;
use tianholiday_sensor::{Cadence, SchedulerConfig};

use crate::error::{ClientError, ClientResult};
use crate::secret::SecretRef;

/// Configuration for the tianholiday client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// tianapi key (supports `pass::` and `env::` prefixes).
    pub api_key: Option<String>,

    /// HTTP settings.
    pub api: ApiSettings,

    /// Fetch schedule and retry policy.
    pub schedule: ScheduleSettings,

    /// Log output.
    pub logging: LoggingSettings,
}

/// HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API root.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: TianApiConfig::DEFAULT_BASE_URL.to_string(),
            timeout_secs: TianApiConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Which cadence model drives the scheduled trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceKind {
    /// Fixed local time every day.
    #[default]
    Daily,
    /// Rolling interval.
    Interval,
}

/// Longest accepted `schedule.retry_delay_secs`: one day.
pub const MAX_RETRY_DELAY_SECS: u64 = 86_400;

/// Longest accepted `schedule.interval_hours`: one year.
pub const MAX_INTERVAL_HOURS: u64 = 366 * 24;

/// Fetch schedule and retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub cadence: CadenceKind,

    /// Local time for the daily cadence, `HH:MM`.
    pub daily_at: String,

    /// Hours between triggers for the interval cadence.
    pub interval_hours: u64,

    /// Retries per cycle after the first failed attempt.
    pub max_retries: u32,

    /// Seconds between a failed attempt and its retry.
    pub retry_delay_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            cadence: CadenceKind::Daily,
            daily_at: "00:01".to_string(),
            interval_hours: 24,
            max_retries: SchedulerConfig::DEFAULT_MAX_RETRIES,
            retry_delay_secs: SchedulerConfig::DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format: `pretty`, `compact` or `json`.
    pub format: LogFormat,

    /// Filter directive, e.g. `tianholiday_sensor=debug`. Overrides `RUST_LOG`.
    pub filter: Option<String>,
}

impl Settings {
    /// Loads configuration from the default path; a missing file yields defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tianholiday")
    }

    /// Resolves the API key: `override_key` (flag or environment) wins over
    /// the file. Secret references are expanded.
    pub fn resolve_api_key(&self, override_key: Option<&str>) -> ClientResult<String> {
        let raw = override_key
            .or(self.api_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ClientError::config(
                    "api_key is not set; add it to config.toml or pass --api-key",
                )
            })?;

        let key = SecretRef::parse(raw).resolve()?;
        if key.trim().is_empty() {
            return Err(ClientError::config("api_key resolved to an empty value"));
        }
        Ok(key.trim().to_string())
    }

    /// Builds the tianapi client configuration for `api_key`.
    pub fn api_config(&self, api_key: String) -> ClientResult<TianApiConfig> {
        if self.api.timeout_secs == 0 {
            return Err(ClientError::config("api.timeout_secs must be greater than 0"));
        }
        let config = TianApiConfig::new(api_key)
            .with_base_url(&self.api.base_url)
            .map_err(|e| {
                ClientError::config(format!("invalid api.base_url {}: {}", self.api.base_url, e))
            })?
            .with_timeout(Duration::from_secs(self.api.timeout_secs));
        Ok(config)
    }

    /// Builds the scheduler configuration.
    pub fn scheduler_config(&self) -> ClientResult<SchedulerConfig> {
        let schedule = &self.schedule;
        let cadence = match schedule.cadence {
            CadenceKind::Daily => {
                let at = NaiveTime::parse_from_str(schedule.daily_at.trim(), "%H:%M").map_err(
                    |e| {
                        ClientError::config(format!(
                            "invalid schedule.daily_at `{}` (expected HH:MM): {}",
                            schedule.daily_at, e
                        ))
                    },
                )?;
                Cadence::DailyAt(at)
            }
            CadenceKind::Interval => {
                if schedule.interval_hours == 0 || schedule.interval_hours > MAX_INTERVAL_HOURS {
                    return Err(ClientError::config(format!(
                        "schedule.interval_hours must be between 1 and {}",
                        MAX_INTERVAL_HOURS
                    )));
                }
                Cadence::every_hours(schedule.interval_hours)
            }
        };

        if schedule.retry_delay_secs > MAX_RETRY_DELAY_SECS {
            return Err(ClientError::config(format!(
                "schedule.retry_delay_secs must be at most {}",
                MAX_RETRY_DELAY_SECS
            )));
        }

        Ok(SchedulerConfig::new(cadence)
            .with_max_retries(schedule.max_retries)
            .with_retry_delay(Duration::from_secs(schedule.retry_delay_secs)))
    }

    /// Checks every setting that can be checked without network access.
    pub fn validate(&self) -> ClientResult<()> {
        self.scheduler_config()?;
        self.api_config("validation".to_string())?;
        Ok(())
    }

    /// Returns a copy safe to print: a literal `api_key` is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = &copy.api_key
            && SecretRef::parse(key).is_plain()
        {
            copy.api_key = Some("<redacted>".to_string());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.api.base_url, "https://apis.tianapi.com/");
        assert_eq!(settings.api.timeout_secs, 10);
        assert_eq!(settings.schedule.cadence, CadenceKind::Daily);
        assert_eq!(settings.schedule.daily_at, "00:01");
        assert_eq!(settings.logging.format, LogFormat::Compact);

        let scheduler = settings.scheduler_config().unwrap();
        assert_eq!(scheduler, SchedulerConfig::default());
    }

    #[test]
    fn parse_full_file() {
        let settings = Settings::parse(
            r#"
            api_key = "abc"

            [api]
            base_url = "http://localhost:9000/"
            timeout_secs = 3

            [schedule]
            cadence = "interval"
            interval_hours = 6
            max_retries = 4
            retry_delay_secs = 60

            [logging]
            format = "json"
            filter = "tianholiday_sensor=debug"
            "#,
        )
        .unwrap();

        assert_eq!(settings.api_key.as_deref(), Some("abc"));
        assert_eq!(settings.api.timeout_secs, 3);
        assert_eq!(settings.logging.format, LogFormat::Json);

        let scheduler = settings.scheduler_config().unwrap();
        assert_eq!(scheduler.cadence, Cadence::every_hours(6));
        assert_eq!(scheduler.max_retries, 4);
        assert_eq!(scheduler.retry_delay, Duration::from_secs(60));

        let api = settings.api_config("abc".into()).unwrap();
        assert_eq!(
            api.endpoint().unwrap().as_str(),
            "http://localhost:9000/jiejiari/index"
        );
        assert_eq!(api.timeout, Duration::from_secs(3));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::parse("[schedule]\ndaily_at = \"07:30\"\n").unwrap();
        assert_eq!(settings.api, ApiSettings::default());
        assert_eq!(settings.schedule.max_retries, 2);
        assert_eq!(
            settings.scheduler_config().unwrap().cadence,
            Cadence::daily_at(7, 30).unwrap()
        );
    }

    #[test]
    fn unknown_cadence_is_rejected() {
        assert!(Settings::parse("[schedule]\ncadence = \"hourly\"\n").is_err());
    }

    #[test]
    fn invalid_schedule_values() {
        let mut settings = Settings::default();
        settings.schedule.daily_at = "25:00".into();
        assert!(matches!(
            settings.scheduler_config(),
            Err(ClientError::Config(_))
        ));

        let mut settings = Settings::default();
        settings.schedule.cadence = CadenceKind::Interval;
        settings.schedule.interval_hours = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn schedule_bounds() {
        let mut settings = Settings::default();
        settings.schedule.retry_delay_secs = u64::MAX;
        let err = settings.scheduler_config().unwrap_err();
        assert!(err.to_string().contains("retry_delay_secs"));

        settings.schedule.retry_delay_secs = MAX_RETRY_DELAY_SECS;
        assert_eq!(
            settings.scheduler_config().unwrap().retry_delay,
            Duration::from_secs(MAX_RETRY_DELAY_SECS)
        );

        let mut settings = Settings::default();
        settings.schedule.cadence = CadenceKind::Interval;
        settings.schedule.interval_hours = u64::MAX;
        let err = settings.scheduler_config().unwrap_err();
        assert!(err.to_string().contains("interval_hours"));

        settings.schedule.interval_hours = MAX_INTERVAL_HOURS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn invalid_api_values() {
        let mut settings = Settings::default();
        settings.api.base_url = "not a url".into();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.api.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn api_key_override_wins() {
        let settings = Settings {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key(None).unwrap(), "from-file");
        assert_eq!(
            settings.resolve_api_key(Some("from-flag")).unwrap(),
            "from-flag"
        );
    }

    #[test]
    fn missing_api_key_errors() {
        let settings = Settings::default();
        let err = settings.resolve_api_key(None).unwrap_err();
        assert!(err.to_string().contains("api_key is not set"));

        let settings = Settings {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(settings.resolve_api_key(None).is_err());
    }

    #[test]
    fn api_key_env_reference() {
        unsafe {
            std::env::set_var("_TIANHOLIDAY_CFG_TEST_KEY", "env-key");
        }
        let settings = Settings {
            api_key: Some("env::_TIANHOLIDAY_CFG_TEST_KEY".into()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key(None).unwrap(), "env-key");
        unsafe {
            std::env::remove_var("_TIANHOLIDAY_CFG_TEST_KEY");
        }

        let err = settings.resolve_api_key(None).unwrap_err();
        assert!(matches!(err, ClientError::Secret(_)));
    }

    #[test]
    fn redacted_masks_plain_key_only() {
        let plain = Settings {
            api_key: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(plain.redacted().api_key.as_deref(), Some("<redacted>"));

        let reference = Settings {
            api_key: Some("pass::tianapi/key".into()),
            ..Default::default()
        };
        assert_eq!(
            reference.redacted().api_key.as_deref(),
            Some("pass::tianapi/key")
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"file-key\"").unwrap();
        writeln!(file, "[schedule]").unwrap();
        writeln!(file, "max_retries = 0").unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("file-key"));
        assert_eq!(settings.schedule.max_retries, 0);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_from_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = ").unwrap();
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn toml_round_trip_of_defaults() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        let parsed = Settings::parse(&text).unwrap();
        assert_eq!(parsed.schedule, ScheduleSettings::default());
        assert_eq!(parsed.api, ApiSettings::default());
    }
}
