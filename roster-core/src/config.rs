//! Runtime configuration for the core.
//!
//! The host app passes its `extra` configuration block as JSON. Every key is
//! optional and falls back to the defaults below.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Base URL used when the host app does not provide one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Request ceiling applied to every backend call, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration JSON could not be parsed.
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value was parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Base URL of the member service.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration pointing at the given base URL.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the per-request timeout in seconds.
    #[must_use]
    pub const fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Parses and validates a configuration from the host app's JSON block.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is unusable.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_core::CoreConfig;
    ///
    /// let config = CoreConfig::from_json(r#"{"apiBaseUrl": "https://api.example.org"}"#).unwrap();
    /// assert_eq!(config.api_base_url, "https://api.example.org");
    /// assert_eq!(config.request_timeout_secs, 10);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty base URL or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("apiBaseUrl must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
