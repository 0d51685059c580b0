//! Connection configuration.
//!
//! A [`ConnectionConfig`] names the service to poll, the token to
//! authenticate with, and how often to poll. Construction validates all
//! three so that bad input is rejected before a coordinator starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Minimum poll interval in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Connection settings for one Karakeep instance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    base_url: String,
    token: String,
    #[serde(default = "default_poll_interval")]
    poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl ConnectionConfig {
    /// Creates a validated configuration.
    ///
    /// The URL's trailing slashes and the token's surrounding whitespace are
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed or non-http(s) URL, an empty
    /// token, or an interval below [`MIN_POLL_INTERVAL_SECS`].
    pub fn new(
        base_url: impl AsRef<str>,
        token: impl AsRef<str>,
        poll_interval_secs: u64,
    ) -> Result<Self, ConfigError> {
        let base_url = normalize_url(base_url.as_ref())?;
        let token = token.as_ref().trim().to_string();
        let config = Self {
            base_url,
            token,
            poll_interval_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a validated configuration with the default interval.
    ///
    /// # Errors
    ///
    /// See [`ConnectionConfig::new`].
    pub fn with_default_interval(
        base_url: impl AsRef<str>,
        token: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        Self::new(base_url, token, DEFAULT_POLL_INTERVAL_SECS)
    }

    /// Re-checks every field.
    ///
    /// Deserialized values bypass [`ConnectionConfig::new`], so callers that
    /// load a config from disk should run this before using it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_url(&self.base_url)?;
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                min: MIN_POLL_INTERVAL_SECS,
                actual: self.poll_interval_secs,
            });
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Poll interval in seconds.
    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Joins an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Token shortened for logs and display.
    pub fn redacted_token(&self) -> String {
        redact(&self.token)
    }
}

// Keeps the token out of debug logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.redacted_token())
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

/// Shortens a secret to its first and last five characters.
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len().min(8));
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}...{tail}")
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingHost(trimmed.to_string()));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
