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
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - a cache name is empty, or both names are equal
    /// - `origin` is not an http(s) URL
    /// - a path prefix does not start with `/`
    /// - `max_bytes` is 0 or exceeds 500MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `quota_bytes` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_cache.is_empty() {
            return Err(invalid("static_cache", "must not be empty"));
        }
        if self.dynamic_cache.is_empty() {
            return Err(invalid("dynamic_cache", "must not be empty"));
        }
        if self.static_cache == self.dynamic_cache {
            return Err(invalid("dynamic_cache", "must differ from static_cache"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "must use http or https"));
        }

        for (field, value) in [
            ("app_shell", &self.app_shell),
            ("api_prefix", &self.api_prefix),
            ("static_prefix", &self.static_prefix),
            ("album_placeholder", &self.album_placeholder),
            ("avatar_placeholder", &self.avatar_placeholder),
        ] {
            if !value.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 500 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 500MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.quota_bytes == 0 {
            return Err(invalid("quota_bytes", "must be greater than 0"));
        }

        for placeholder in [&self.album_placeholder, &self.avatar_placeholder, &self.app_shell] {
            if !self.precache.contains(placeholder) {
                tracing::warn!(
                    path = %placeholder,
                    "fallback asset is not in the precache list; offline fallback for it will miss"
                );
            }
        }

        Ok(())
    }
}
