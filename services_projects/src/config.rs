//! Backend connection settings

use std::time::Duration;

use services_settings::{keys, SettingsRegistry};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API URL is not defined")]
    MissingApiUrl,

    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid request timeout: {0}s")]
    InvalidTimeout(i64),
}

/// Where and how to reach the project backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectsConfig {
    /// Base URL without a trailing slash
    pub api_url: String,
    pub timeout: Duration,
}

impl ProjectsConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.trim();
        if api_url.is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url.to_string()));
        }
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `projects.api_url` and `projects.timeout_secs`
    pub fn from_settings(settings: &SettingsRegistry) -> Result<Self, ConfigError> {
        let api_url = settings
            .get_string(keys::PROJECTS_API_URL)
            .ok_or(ConfigError::MissingApiUrl)?;
        let mut config = Self::new(api_url)?;

        if let Some(secs) = settings.get_integer(keys::PROJECTS_TIMEOUT_SECS) {
            if secs <= 0 {
                return Err(ConfigError::InvalidTimeout(secs));
            }
            config.timeout = Duration::from_secs(secs as u64);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_settings::{SettingLayer, SettingValue};

    #[test]
    fn test_missing_url() {
        let settings = SettingsRegistry::with_builtin_defaults();
        let err = ProjectsConfig::from_settings(&settings).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiUrl);
        assert_eq!(err.to_string(), "API URL is not defined");
    }

    #[test]
    fn test_from_settings() {
        let mut settings = SettingsRegistry::with_builtin_defaults();
        settings.set(
            keys::PROJECTS_API_URL,
            SettingValue::String("http://localhost:8000/".into()),
            SettingLayer::Environment,
        );
        settings.set(
            keys::PROJECTS_TIMEOUT_SECS,
            SettingValue::Integer(3),
            SettingLayer::File,
        );

        let config = ProjectsConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            ProjectsConfig::new("ftp://x"),
            Err(ConfigError::InvalidApiUrl("ftp://x".into()))
        );

        let mut settings = SettingsRegistry::with_builtin_defaults();
        settings.set(
            keys::PROJECTS_API_URL,
            SettingValue::String("https://api.test".into()),
            SettingLayer::File,
        );
        settings.set(
            keys::PROJECTS_TIMEOUT_SECS,
            SettingValue::Integer(0),
            SettingLayer::File,
        );
        assert_eq!(
            ProjectsConfig::from_settings(&settings),
            Err(ConfigError::InvalidTimeout(0))
        );
    }
}
