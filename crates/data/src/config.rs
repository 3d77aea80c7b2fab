//! Data layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLUE_PAPAYA_REMOTE_URL` - Base URL of the managed remote database
//! - `BLUE_PAPAYA_REMOTE_KEY` - API key for the remote database
//!
//! ## Optional
//! - `BLUE_PAPAYA_PROFILE_DIR` - On-device profile directory holding the
//!   local cache (default: `.blue-papaya`)
//! - `BLUE_PAPAYA_NOTIFY_POLL_SECS` - Notification poll period in seconds
//!   (default: 5)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::ConfigError;

/// Default notification poll period.
const DEFAULT_NOTIFY_POLL_SECS: u64 = 5;

/// Data layer configuration.
///
/// Implements `Debug` manually to redact the remote API key.
#[derive(Clone)]
pub struct DataConfig {
    /// Base URL of the managed remote database.
    pub remote_url: Url,
    /// API key for the remote database.
    pub remote_key: SecretString,
    /// Profile directory holding the on-device cache.
    pub profile_dir: PathBuf,
    /// Period of the admin notification polling backstop.
    pub notify_poll: Duration,
}

impl std::fmt::Debug for DataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataConfig")
            .field("remote_url", &self.remote_url.as_str())
            .field("remote_key", &"[REDACTED]")
            .field("profile_dir", &self.profile_dir)
            .field("notify_poll", &self.notify_poll)
            .finish()
    }
}

impl DataConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote_url = get_required("BLUE_PAPAYA_REMOTE_URL")?;
        let remote_url = parse_base_url("BLUE_PAPAYA_REMOTE_URL", &remote_url)?;

        let remote_key = SecretString::from(get_required("BLUE_PAPAYA_REMOTE_KEY")?);

        let profile_dir =
            PathBuf::from(get_env_or_default("BLUE_PAPAYA_PROFILE_DIR", ".blue-papaya"));

        let notify_poll_secs = get_env_or_default(
            "BLUE_PAPAYA_NOTIFY_POLL_SECS",
            &DEFAULT_NOTIFY_POLL_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("BLUE_PAPAYA_NOTIFY_POLL_SECS".to_owned(), e.to_string())
        })?;

        Ok(Self {
            remote_url,
            remote_key,
            profile_dir,
            notify_poll: Duration::from_secs(notify_poll_secs),
        })
    }

    /// Build a configuration directly, for embedders and tests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `remote_url` is not a usable http(s) base URL.
    pub fn new(
        remote_url: &str,
        remote_key: impl Into<String>,
        profile_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            remote_url: parse_base_url("remote_url", remote_url)?,
            remote_key: SecretString::from(remote_key.into()),
            profile_dir: profile_dir.into(),
            notify_poll: Duration::from_secs(DEFAULT_NOTIFY_POLL_SECS),
        })
    }

    /// Override the notification poll period, builder-style.
    #[must_use]
    pub fn with_notify_poll(mut self, period: Duration) -> Self {
        self.notify_poll = period;
        self
    }
}

/// Parse and validate a base URL.
fn parse_base_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            "must be an http(s) base URL".to_owned(),
        ));
    }

    Ok(url)
}

/// Get a required environment variable.
fn get_required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_url() {
        assert!(DataConfig::new("https://db.example.com", "key", "/tmp/p").is_ok());
        assert!(DataConfig::new("not a url", "key", "/tmp/p").is_err());
        assert!(DataConfig::new("ftp://db.example.com", "key", "/tmp/p").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = DataConfig::new("https://db.example.com", "super-secret", "/tmp/p").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
