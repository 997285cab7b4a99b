//! Worker lifecycle dispatcher.
//!
//! One method per worker event. The host calls `install`, then `activate`
//! (or sends `SKIP_WAITING`), and only then do fetches get intercepted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ouca_core::cache::{ActivateReport, InstallReport};
use ouca_core::config::ConfigError;
use ouca_core::{AppConfig, CacheDb, CacheStore, Error, Network, WorkerRequest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::router::{CacheRouter, RouteOutcome, RouterRules};

/// Tag the page registers for deferred downloads.
pub const SYNC_DOWNLOADS_TAG: &str = "sync-downloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// A message posted by a client page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Acknowledged,
    Ignored,
}

/// What the page should display for a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
}

#[derive(Deserialize)]
struct PushPayload {
    title: String,
    #[serde(default)]
    body: String,
}

/// Outcome of the install event.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InstallOutcome {
    /// Precache URLs stored and the ones that failed.
    pub report: InstallReport,
    /// Whether skip-waiting was requested by the time install finished.
    pub skip_waiting: bool,
    /// Present when skip-waiting carried the worker straight into activation.
    pub activation: Option<ActivateReport>,
}

#[derive(Debug)]
struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

/// Handles every lifecycle event for one worker version.
pub struct Worker {
    store: CacheStore,
    router: CacheRouter,
    network: Arc<dyn Network>,
    precache: Vec<Url>,
    notification_icon: String,
    skip_waiting_on_install: bool,
    lifecycle: Mutex<Lifecycle>,
}

impl Worker {
    pub fn new(router: CacheRouter, network: Arc<dyn Network>, precache: Vec<Url>, notification_icon: String) -> Self {
        Self {
            store: router.store().clone(),
            router,
            network,
            precache,
            notification_icon,
            skip_waiting_on_install: true,
            lifecycle: Mutex::new(Lifecycle { state: WorkerState::Parsed, skip_waiting: false, clients_claimed: false }),
        }
    }

    /// Whether install requests skip-waiting itself. When off, an installed
    /// worker waits for `SKIP_WAITING` or an explicit activate event.
    pub fn with_skip_waiting_on_install(mut self, enabled: bool) -> Self {
        self.skip_waiting_on_install = enabled;
        self
    }

    /// Wire up store, router and precache list from the loaded configuration.
    pub fn from_config(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, ConfigError> {
        let store = CacheStore::new(db, config.cache_versions()).with_quota(config.quota_bytes);
        let rules = RouterRules::from_config(config)?;
        let router = CacheRouter::new(store, Arc::clone(&network), rules);
        Ok(Self::new(router, network, config.precache_urls()?, config.notification_icon.clone())
            .with_skip_waiting_on_install(config.skip_waiting_on_install))
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle().state
    }

    pub fn clients_claimed(&self) -> bool {
        self.lifecycle().clients_claimed
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.lifecycle().skip_waiting
    }

    pub fn router(&self) -> &CacheRouter {
        &self.router
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// The network the worker fetches through; hosts reuse it for requests
    /// the worker does not intercept.
    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Install event: pre-cache the static assets.
    ///
    /// Individual asset failures land in the report. Only a storage failure
    /// on the partition itself makes the worker redundant. If skip-waiting
    /// was requested, by configuration or by a `SKIP_WAITING` message that
    /// arrived mid-install, the worker activates right away.
    pub async fn install(&self) -> Result<InstallOutcome, Error> {
        self.transition(&[WorkerState::Parsed], WorkerState::Installing)?;

        let report = match self.store.initialize(self.network.as_ref(), &self.precache).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.lifecycle().state = WorkerState::Redundant;
                return Err(e);
            }
        };

        let skip_waiting = {
            let mut lifecycle = self.lifecycle();
            lifecycle.state = WorkerState::Installed;
            lifecycle.skip_waiting |= self.skip_waiting_on_install;
            lifecycle.skip_waiting
        };

        let activation = if skip_waiting { Some(self.activate().await?) } else { None };
        Ok(InstallOutcome { report, skip_waiting, activation })
    }

    /// Activate event: drop stale partitions and claim open clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.transition(&[WorkerState::Installed], WorkerState::Activating)?;

        match self.store.activate().await {
            Ok(report) => {
                let mut lifecycle = self.lifecycle();
                lifecycle.state = WorkerState::Activated;
                lifecycle.clients_claimed = true;
                tracing::info!(deleted = report.deleted.len(), kept = report.kept.len(), "worker activated");
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "activate failed");
                self.lifecycle().state = WorkerState::Installed;
                Err(e)
            }
        }
    }

    /// Fetch event. Nothing is intercepted until the worker is active.
    pub async fn handle_fetch(&self, request: &WorkerRequest) -> RouteOutcome {
        if self.state() != WorkerState::Activated {
            return RouteOutcome::Passthrough(self.router.classify(request));
        }
        self.router.route(request).await
    }

    /// Message event. `SKIP_WAITING` activates an installed worker and
    /// returns the activation report. During install it is remembered and
    /// acted on when install finishes.
    pub async fn handle_message(&self, message: &serde_json::Value) -> Result<Option<ActivateReport>, Error> {
        let message = serde_json::from_value(message.clone()).unwrap_or(WorkerMessage::Other);
        if message != WorkerMessage::SkipWaiting {
            tracing::debug!("ignoring client message");
            return Ok(None);
        }

        let installed = {
            let mut lifecycle = self.lifecycle();
            lifecycle.skip_waiting = true;
            lifecycle.state == WorkerState::Installed
        };
        if !installed {
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Background sync event.
    pub fn handle_sync(&self, tag: &str) -> SyncOutcome {
        if tag == SYNC_DOWNLOADS_TAG {
            tracing::info!(tag, "syncing pending downloads");
            SyncOutcome::Acknowledged
        } else {
            tracing::debug!(tag, "ignoring sync tag");
            SyncOutcome::Ignored
        }
    }

    /// Push event. No payload means no notification.
    pub fn handle_push(&self, payload: Option<&str>) -> Result<Option<Notification>, Error> {
        let Some(payload) = payload.filter(|p| !p.trim().is_empty()) else {
            return Ok(None);
        };
        let data: PushPayload =
            serde_json::from_str(payload).map_err(|e| Error::InvalidInput(format!("push payload: {e}")))?;

        Ok(Some(Notification {
            title: data.title,
            body: data.body,
            icon: self.notification_icon.clone(),
            badge: self.notification_icon.clone(),
        }))
    }

    fn transition(&self, from: &[WorkerState], to: WorkerState) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle();
        if !from.contains(&lifecycle.state) {
            return Err(Error::InvalidState(format!("cannot move from {:?} to {:?}", lifecycle.state, to)));
        }
        lifecycle.state = to;
        Ok(())
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
