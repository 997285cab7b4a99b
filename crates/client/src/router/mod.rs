//! Fetch strategy selection.
//!
//! `CacheRouter` classifies each intercepted request and runs the matching
//! strategy against the cache store and the network:
//!
//! | class        | strategy                                  | writes to |
//! |--------------|-------------------------------------------|-----------|
//! | navigation   | network first, cached page, app shell     | static    |
//! | api          | network first, cache, offline JSON 503    | dynamic   |
//! | static asset | cache first + background revalidation     | static    |
//! | remote       | network first, cache, empty 503           | dynamic (storage hosts only) |
//!
//! Non-GET and ignored requests are not intercepted at all.

pub mod classify;
pub mod fallback;
mod strategy;

use std::sync::Arc;

use ouca_core::{CacheStore, Network, WorkerRequest, WorkerResponse};

pub use classify::{RouteClass, RouterRules};

use crate::background::BackgroundTasks;

/// What the host should do with a request.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Not intercepted; the host fetches it normally.
    Passthrough(RouteClass),
    /// Answer the page with this response.
    Respond { class: RouteClass, response: WorkerResponse },
}

impl RouteOutcome {
    pub fn class(&self) -> RouteClass {
        match self {
            RouteOutcome::Passthrough(class) => *class,
            RouteOutcome::Respond { class, .. } => *class,
        }
    }

    pub fn into_response(self) -> Option<WorkerResponse> {
        match self {
            RouteOutcome::Passthrough(_) => None,
            RouteOutcome::Respond { response, .. } => Some(response),
        }
    }
}

/// Routes intercepted requests to a caching strategy.
#[derive(Clone)]
pub struct CacheRouter {
    store: CacheStore,
    network: Arc<dyn Network>,
    rules: RouterRules,
    background: BackgroundTasks,
}

impl CacheRouter {
    pub fn new(store: CacheStore, network: Arc<dyn Network>, rules: RouterRules) -> Self {
        Self { store, network, rules, background: BackgroundTasks::new() }
    }

    pub fn rules(&self) -> &RouterRules {
        &self.rules
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Background revalidation tasks started by this router.
    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub fn classify(&self, request: &WorkerRequest) -> RouteClass {
        self.rules.classify(request)
    }

    /// Classify and, when intercepted, answer the request. Never fails.
    pub async fn route(&self, request: &WorkerRequest) -> RouteOutcome {
        let class = self.classify(request);
        tracing::debug!(method = %request.method, url = %request.url, %class, "routing request");

        let response = match class {
            RouteClass::Bypass | RouteClass::Ignored => return RouteOutcome::Passthrough(class),
            RouteClass::Navigation => self.network_first_with_shell(request).await,
            RouteClass::Api => self.network_first_with_json_error(request).await,
            RouteClass::StaticAsset => self.cache_first_with_revalidation(request).await,
            RouteClass::Remote => self.network_first_silent(request).await,
        };

        RouteOutcome::Respond { class, response }
    }
}
