//! The four caching strategies.
//!
//! Every strategy returns a response: network failures fall back to the
//! cache, then to a synthesized response. Cache writes are best effort.

use std::sync::Arc;

use ouca_core::{PartitionPurpose, WorkerRequest, WorkerResponse};
use url::Url;

use super::CacheRouter;
use super::fallback;

impl CacheRouter {
    /// Navigation: network first, then the exact cached page, then the app shell.
    pub(super) async fn network_first_with_shell(&self, request: &WorkerRequest) -> WorkerResponse {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(PartitionPurpose::Static, request, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation offline, trying cache");
                if let Some(hit) = self.lookup(request).await {
                    return hit;
                }
                if let Some(shell_url) = self.rules.site_url(&self.rules.app_shell)
                    && let Some(shell) = self.lookup_url(&shell_url).await
                {
                    return shell;
                }
                fallback::unavailable()
            }
        }
    }

    /// API: network first, then cache, then the offline JSON error.
    pub(super) async fn network_first_with_json_error(&self, request: &WorkerRequest) -> WorkerResponse {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(PartitionPurpose::Dynamic, request, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "api offline, trying cache");
                match self.lookup(request).await {
                    Some(hit) => hit,
                    None => fallback::offline_api(),
                }
            }
        }
    }

    /// Static asset: serve the cached copy and refresh it in the background;
    /// on a miss fetch it, falling back to a placeholder image.
    pub(super) async fn cache_first_with_revalidation(&self, request: &WorkerRequest) -> WorkerResponse {
        if let Some(hit) = self.lookup(request).await {
            self.revalidate(request);
            return hit;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_best_effort(PartitionPurpose::Static, request, &response).await;
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "asset offline and uncached");
                if let Some(path) = self.rules.placeholder_for(&request.url)
                    && let Some(placeholder_url) = self.rules.site_url(path)
                    && let Some(placeholder) = self.lookup_url(&placeholder_url).await
                {
                    return placeholder;
                }
                fallback::not_found()
            }
        }
    }

    /// Everything else: network first, keeping storage-host objects; then
    /// cache, then an empty 503.
    pub(super) async fn network_first_silent(&self, request: &WorkerRequest) -> WorkerResponse {
        match self.network.fetch(request).await {
            Ok(response) => {
                if self.rules.is_storage_host(&request.url) {
                    self.store_best_effort(PartitionPurpose::Dynamic, request, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "remote offline, trying cache");
                match self.lookup(request).await {
                    Some(hit) => hit,
                    None => fallback::unavailable(),
                }
            }
        }
    }

    fn revalidate(&self, request: &WorkerRequest) {
        let store = self.store.clone();
        let network = Arc::clone(&self.network);
        let request = request.clone();
        self.background.spawn("revalidate", async move {
            let response = network.fetch(&request).await?;
            if store.put(PartitionPurpose::Static, &request, &response).await? {
                tracing::trace!(url = %request.url, "revalidated cached asset");
            }
            Ok(())
        });
    }

    async fn store_best_effort(&self, purpose: PartitionPurpose, request: &WorkerRequest, response: &WorkerResponse) {
        if let Err(e) = self.store.put(purpose, request, response).await {
            tracing::debug!(url = %request.url, %purpose, error = %e, "cache write skipped");
        }
    }

    async fn lookup(&self, request: &WorkerRequest) -> Option<WorkerResponse> {
        match self.store.match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn lookup_url(&self, url: &Url) -> Option<WorkerResponse> {
        self.lookup(&WorkerRequest::get(url.clone())).await
    }
}
