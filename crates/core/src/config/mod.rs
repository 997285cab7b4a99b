//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OUCA_*)
//! 2. TOML config file (if OUCA_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheVersions;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OUCA_*)
/// 2. TOML config file (if OUCA_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via OUCA_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the web app is served from. Relative request paths and the
    /// precache list resolve against it.
    ///
    /// Set via OUCA_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current static partition. Bump on every deploy.
    #[serde(default = "default_static_cache")]
    pub static_cache: String,

    /// Name of the current dynamic partition. Bumped together with `static_cache`.
    #[serde(default = "default_dynamic_cache")]
    pub dynamic_cache: String,

    /// Paths fetched into the static partition at install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served for navigations when offline and uncached.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,

    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Host fragments identifying user-upload storage (covers, avatars, audio).
    ///
    /// Set via OUCA_STORAGE_DOMAINS as a TOML-style array, e.g. `["supabase"]`.
    #[serde(default = "default_storage_domains")]
    pub storage_domains: Vec<String>,

    /// The only localhost port the worker intercepts.
    #[serde(default = "default_dev_port")]
    pub dev_port: u16,

    #[serde(default = "default_album_placeholder")]
    pub album_placeholder: String,

    #[serde(default = "default_avatar_placeholder")]
    pub avatar_placeholder: String,

    /// Icon and badge for push notifications.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OUCA_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via OUCA_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via OUCA_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total body bytes the cache may hold across all partitions.
    ///
    /// Set via OUCA_QUOTA_BYTES environment variable.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,

    /// Activate as soon as install finishes instead of waiting for a
    /// `SKIP_WAITING` message or an explicit activate event.
    ///
    /// Set via OUCA_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_skip_waiting_on_install")]
    pub skip_waiting_on_install: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ouca-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_static_cache() -> String {
    "musicasua-v2".into()
}

fn default_dynamic_cache() -> String {
    "musicasua-dynamic-v2".into()
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/images/default-album.png", "/images/default-avatar.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_app_shell() -> String {
    "/index.html".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_storage_domains() -> Vec<String> {
    vec!["supabase".into()]
}

fn default_dev_port() -> u16 {
    3000
}

fn default_album_placeholder() -> String {
    "/images/default-album.png".into()
}

fn default_avatar_placeholder() -> String {
    "/images/default-avatar.png".into()
}

fn default_notification_icon() -> String {
    "/logo192.png".into()
}

fn default_user_agent() -> String {
    "ouca-worker/0.1".into()
}

fn default_max_bytes() -> usize {
    52_428_800 // 50MB, full-length tracks
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_quota_bytes() -> u64 {
    536_870_912 // 512MB
}

fn default_skip_waiting_on_install() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            static_cache: default_static_cache(),
            dynamic_cache: default_dynamic_cache(),
            precache: default_precache(),
            app_shell: default_app_shell(),
            api_prefix: default_api_prefix(),
            static_prefix: default_static_prefix(),
            storage_domains: default_storage_domains(),
            dev_port: default_dev_port(),
            album_placeholder: default_album_placeholder(),
            avatar_placeholder: default_avatar_placeholder(),
            notification_icon: default_notification_icon(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            quota_bytes: default_quota_bytes(),
            skip_waiting_on_install: default_skip_waiting_on_install(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The partition names for this deploy.
    pub fn cache_versions(&self) -> CacheVersions {
        CacheVersions::new(&self.static_cache, &self.dynamic_cache)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Precache paths resolved against the origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or any entry does not parse.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let origin = self.origin_url()?;
        self.precache
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: format!("{path}: {e}") })
            })
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OUCA_`
    /// 2. TOML file from `OUCA_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OUCA_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OUCA_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
