//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is empty or contains whitespace
    /// - `origin` is not an absolute http(s) URL
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - a `precache` entry is neither an absolute path nor a URL
    ///
    /// Returns `ConfigError::Missing` if `offline_page` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }
        if self.cache_version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must not contain whitespace".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {}", origin.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() }),
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.offline_page.is_empty() {
            return Err(ConfigError::Missing {
                field: "offline_page".into(),
                hint: "Set SWCACHE_OFFLINE_PAGE to the path of the offline document".into(),
            });
        }

        if let Some(bad) = self
            .precache
            .iter()
            .find(|entry| !entry.starts_with('/') && !entry.contains("://"))
        {
            return Err(ConfigError::Invalid {
                field: "precache".into(),
                reason: format!("{bad} is not an absolute path or URL"),
            });
        }

        if !self.precache.iter().any(|entry| entry == &self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline_page is not in the precache manifest; \
                 offline document fallback will only work once it has been fetched"
            );
        }

        Ok(())
    }
}
