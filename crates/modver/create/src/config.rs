//! Configuration for the module version handler

use crate::backoff::ConstantBackoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Polling cadence and overall budget
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay between status queries in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Budget for the whole attempt in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackoffConfig {
    pub fn policy(&self) -> ConstantBackoff {
        ConstantBackoff::new(
            Duration::from_secs(self.delay_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_delay_secs() -> u64 {
    ConstantBackoff::DEFAULT_DELAY.as_secs()
}

fn default_timeout_secs() -> u64 {
    ConstantBackoff::DEFAULT_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HandlerConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `MODVER_`-prefixed environment variables (`MODVER_BACKOFF__DELAY_SECS=5`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&HandlerConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MODVER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_registration_cadence() {
        let config = HandlerConfig::default();
        assert_eq!(config.backoff.delay_secs, 15);
        assert_eq!(config.backoff.timeout_secs, 30 * 60);
        assert_eq!(config.backoff.policy(), ConstantBackoff::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = HandlerConfig::load(Some("/nonexistent/modver-config")).unwrap();
        assert_eq!(config.backoff, BackoffConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("modver-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[backoff]\ndelay_secs = 2\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let config = HandlerConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.backoff.delay_secs, 2);
        assert_eq!(config.backoff.timeout_secs, 1800);
        assert!(config.logging.json);
    }

    #[test]
    fn partial_sections_deserialize_with_defaults() {
        let config: HandlerConfig =
            serde_json::from_str(r#"{"backoff": {"timeout_secs": 60}}"#).unwrap();
        assert_eq!(config.backoff.delay_secs, 15);
        assert_eq!(config.backoff.policy().timeout(), Duration::from_secs(60));
    }
}
