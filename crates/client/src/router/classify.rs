//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//! non-GET, ignored, navigation, API, static asset, everything else.

use std::fmt;
use std::sync::LazyLock;

use ouca_core::{AppConfig, RequestMode, WorkerRequest};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

static STATIC_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(js|css|png|jpg|jpeg|gif|svg|woff|woff2|ttf|eot|ico)$").expect("static extension regex")
});

/// Which strategy a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Not a GET; passed through untouched.
    Bypass,
    /// Developer tooling (`chrome-extension:`, localhost on another port).
    Ignored,
    /// Page navigation or HTML; network first, app shell fallback.
    Navigation,
    /// Backend API; network first, JSON offline fallback.
    Api,
    /// Build assets and images; cache first with background refresh.
    StaticAsset,
    /// Anything else, e.g. storage objects; network first, silent fallback.
    Remote,
}

impl RouteClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteClass::Bypass => "bypass",
            RouteClass::Ignored => "ignored",
            RouteClass::Navigation => "navigation",
            RouteClass::Api => "api",
            RouteClass::StaticAsset => "static_asset",
            RouteClass::Remote => "remote",
        }
    }

    /// Whether the router answers this class itself.
    pub fn is_intercepted(self) -> bool {
        !matches!(self, RouteClass::Bypass | RouteClass::Ignored)
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification inputs and fallback locations.
#[derive(Debug, Clone)]
pub struct RouterRules {
    pub origin: Url,
    pub app_shell: String,
    pub api_prefix: String,
    pub static_prefix: String,
    pub storage_domains: Vec<String>,
    pub dev_port: u16,
    pub album_placeholder: String,
    pub avatar_placeholder: String,
}

impl RouterRules {
    /// Build rules from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ouca_core::config::ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            app_shell: config.app_shell.clone(),
            api_prefix: config.api_prefix.clone(),
            static_prefix: config.static_prefix.clone(),
            storage_domains: config.storage_domains.clone(),
            dev_port: config.dev_port,
            album_placeholder: config.album_placeholder.clone(),
            avatar_placeholder: config.avatar_placeholder.clone(),
        })
    }

    pub fn classify(&self, request: &WorkerRequest) -> RouteClass {
        let url = &request.url;

        if !request.is_get() {
            return RouteClass::Bypass;
        }
        if self.is_ignored(url) {
            return RouteClass::Ignored;
        }
        if request.mode == RequestMode::Navigate || request.accept().is_some_and(|a| a.contains("text/html")) {
            return RouteClass::Navigation;
        }
        if url.path().starts_with(&self.api_prefix) {
            return RouteClass::Api;
        }
        if STATIC_EXTENSION.is_match(url.path()) || url.path().starts_with(&self.static_prefix) {
            return RouteClass::StaticAsset;
        }
        RouteClass::Remote
    }

    fn is_ignored(&self, url: &Url) -> bool {
        if url.scheme() == "chrome-extension" {
            return true;
        }
        url.host_str() == Some("localhost") && url.port_or_known_default() != Some(self.dev_port)
    }

    /// Whether a 200 from this URL should be kept in the dynamic partition.
    pub fn is_storage_host(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.storage_domains.iter().any(|domain| host.contains(domain.as_str())))
    }

    /// Placeholder path for an image URL that could not be fetched.
    pub fn placeholder_for(&self, url: &Url) -> Option<&str> {
        let s = url.as_str();
        if s.contains("album") || s.contains("cover") {
            Some(&self.album_placeholder)
        } else if s.contains("avatar") || s.contains("profile") {
            Some(&self.avatar_placeholder)
        } else {
            None
        }
    }

    /// Resolve a site path (app shell, placeholder) against the origin.
    pub fn site_url(&self, path: &str) -> Option<Url> {
        self.origin.join(path).ok()
    }
}
