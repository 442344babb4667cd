use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::{
    DEFAULT_API_BASE_URL, DEFAULT_COUNTDOWN_SECS, DEFAULT_GEOCODER_URL, DEFAULT_GRACE_PERIOD_SECS,
    DEFAULT_SEARCH_RESULT_LIMIT, DEFAULT_TICK_MILLIS,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Runtime settings supplied by the shell. Every field has a default so a
/// partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub geocoder_url: String,
    pub search_result_limit: usize,
    pub countdown_secs: u32,
    pub grace_period_secs: u32,
    pub tick_millis: u64,
    pub sos_keys: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            tick_millis: DEFAULT_TICK_MILLIS,
            sos_keys: vec!["F1".into(), "F2".into(), "Escape".into()],
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_url("api_base_url", &self.api_base_url)?;
        Self::validate_url("geocoder_url", &self.geocoder_url)?;

        if self.countdown_secs == 0 {
            return Err(ConfigError::Zero {
                field: "countdown_secs",
            });
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::Zero {
                field: "tick_millis",
            });
        }
        if self.search_result_limit == 0 {
            return Err(ConfigError::Zero {
                field: "search_result_limit",
            });
        }
        Ok(())
    }

    /// `path` is appended to the API base, e.g. `endpoint("/locations")`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn is_sos_key(&self, key: &str) -> bool {
        self.sos_keys.iter().any(|k| k == key)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.grace_period_secs))
    }

    fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
        let parsed = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidUrl {
                field,
                value: value.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(ClientConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_base_url": "https://routes.example.com/api/"}"#)
                .unwrap();
        assert_eq!(config.countdown_secs, 5);
        assert_eq!(config.grace_period_secs, 3);
        assert_eq!(
            config.endpoint("/locations"),
            "https://routes.example.com/api/locations"
        );
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let config = ClientConfig {
            geocoder_url: "ftp://geo.example.com".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                field: "geocoder_url",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_countdown() {
        let config = ClientConfig {
            countdown_secs: 0,
            ..ClientConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "countdown_secs"
            })
        );
    }

    #[test]
    fn test_sos_keys() {
        let config = ClientConfig::default();
        assert!(config.is_sos_key("F1"));
        assert!(config.is_sos_key("F2"));
        assert!(config.is_sos_key("Escape"));
        assert!(!config.is_sos_key("Enter"));
    }
}
