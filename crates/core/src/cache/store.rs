//! Versioned partition lifecycle.
//!
//! `CacheStore` pairs the database with the partition names of the
//! current deploy. Install pre-populates the static partition, activate
//! drops every partition that belongs to another deploy, and fetch handling
//! reads and writes through `get`, `put` and `match_request`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::connection::CacheDb;
use super::entries::CacheEntry;
use super::hash::compute_request_key;
use super::partitions::PartitionPurpose;
use crate::Error;
use crate::exchange::{WorkerRequest, WorkerResponse};
use crate::network::Network;

/// The partition names of the current deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVersions {
    static_name: String,
    dynamic_name: String,
}

impl CacheVersions {
    pub fn new(static_name: impl Into<String>, dynamic_name: impl Into<String>) -> Self {
        Self { static_name: static_name.into(), dynamic_name: dynamic_name.into() }
    }

    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    pub fn dynamic_name(&self) -> &str {
        &self.dynamic_name
    }

    pub fn name_for(&self, purpose: PartitionPurpose) -> &str {
        match purpose {
            PartitionPurpose::Static => &self.static_name,
            PartitionPurpose::Dynamic => &self.dynamic_name,
        }
    }

    /// Whether a partition name belongs to this deploy.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name
    }
}

/// An asset that could not be pre-cached.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedAsset {
    pub url: String,
    pub reason: String,
}

/// Outcome of pre-populating the static partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<FailedAsset>,
}

/// Outcome of garbage-collecting stale partitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Cache partitions scoped to one deploy's version pair.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    versions: CacheVersions,
    quota: Option<u64>,
}

impl CacheStore {
    pub fn new(db: CacheDb, versions: CacheVersions) -> Self {
        Self { db, versions, quota: None }
    }

    /// Limit total stored body bytes across all partitions.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota = Some(quota_bytes);
        self
    }

    pub fn versions(&self) -> &CacheVersions {
        &self.versions
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Open the static partition and try to pre-cache every asset.
    ///
    /// Each asset is fetched and stored independently; a failure is logged
    /// and recorded in the report, never returned. Only failing to create
    /// the partition itself is an error.
    pub async fn initialize(&self, network: &dyn Network, assets: &[Url]) -> Result<InstallReport, Error> {
        self.db
            .open_partition(self.versions.static_name(), PartitionPurpose::Static)
            .await?;

        let mut report = InstallReport::default();
        for url in assets {
            let request = WorkerRequest::get(url.clone());
            let outcome = match network.fetch(&request).await {
                Ok(response) if response.is_cacheable() => self.put(PartitionPurpose::Static, &request, &response).await,
                Ok(response) => Err(Error::Network(format!("status {}", response.status))),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(_) => report.cached.push(url.to_string()),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "asset could not be pre-cached");
                    report.failed.push(FailedAsset { url: url.to_string(), reason: e.to_string() });
                }
            }
        }

        tracing::info!(
            partition = self.versions.static_name(),
            cached = report.cached.len(),
            failed = report.failed.len(),
            "static partition initialized"
        );
        Ok(report)
    }

    /// Delete every partition that is not part of the current version pair.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let mut report = ActivateReport::default();
        for name in self.db.partition_names().await? {
            if self.versions.is_current(&name) {
                report.kept.push(name);
            } else {
                self.db.delete_partition(&name).await?;
                tracing::info!(partition = %name, "deleted stale partition");
                report.deleted.push(name);
            }
        }
        Ok(report)
    }

    /// Look a request up in the current partition for `purpose`.
    pub async fn get(&self, purpose: PartitionPurpose, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        let key = compute_request_key(&request.method, &request.url);
        let entry = self.db.get_entry(self.versions.name_for(purpose), &key).await?;
        Ok(entry.map(CacheEntry::into_response))
    }

    /// Store a snapshot of `response` in the current partition for `purpose`.
    ///
    /// Returns `Ok(false)` without writing when the response is not a 200
    /// or the request is not a GET. The caller keeps its own response; the
    /// stored snapshot shares the body buffer.
    pub async fn put(
        &self, purpose: PartitionPurpose, request: &WorkerRequest, response: &WorkerResponse,
    ) -> Result<bool, Error> {
        if !response.is_cacheable() || !request.is_get() {
            return Ok(false);
        }

        let partition = self.versions.name_for(purpose);
        self.db.open_partition(partition, purpose).await?;
        self.db
            .put_entry(partition, &CacheEntry::from_exchange(request, response), self.quota)
            .await?;
        tracing::trace!(partition, url = %request.url, "stored response");
        Ok(true)
    }

    /// Look a request up across every partition, oldest first.
    pub async fn match_request(&self, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        let key = compute_request_key(&request.method, &request.url);
        Ok(self.db.match_entry(&key).await?.map(CacheEntry::into_response))
    }

    /// `match_request` for a plain GET of `url`.
    pub async fn match_url(&self, url: &Url) -> Result<Option<WorkerResponse>, Error> {
        self.match_request(&WorkerRequest::get(url.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ResponseSource;
    use async_trait::async_trait;

    /// Serves 200 for every path except those listed as missing or broken.
    struct AssetServer {
        missing: Vec<&'static str>,
        unreachable: Vec<&'static str>,
    }

    #[async_trait]
    impl Network for AssetServer {
        async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
            let path = request.url.path();
            if self.unreachable.contains(&path) {
                return Err(Error::Network("connection refused".into()));
            }
            if self.missing.contains(&path) {
                return Ok(WorkerResponse::new(404, "not found"));
            }
            Ok(WorkerResponse::new(200, format!("asset {path}")))
        }
    }

    fn versions() -> CacheVersions {
        CacheVersions::new("musicasua-v2", "musicasua-dynamic-v2")
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:3000").unwrap().join(path).unwrap()
    }

    async fn store() -> CacheStore {
        CacheStore::new(CacheDb::open_in_memory().await.unwrap(), versions())
    }

    #[test]
    fn test_versions_is_current() {
        let v = versions();
        assert!(v.is_current("musicasua-v2"));
        assert!(v.is_current("musicasua-dynamic-v2"));
        assert!(!v.is_current("musicasua-v1"));
        assert_eq!(v.name_for(PartitionPurpose::Dynamic), "musicasua-dynamic-v2");
    }

    #[tokio::test]
    async fn test_initialize_survives_missing_asset() {
        let store = store().await;
        let network = AssetServer { missing: vec!["/manifest.json"], unreachable: vec!["/images/default-avatar.png"] };
        let assets = vec![url("/"), url("/index.html"), url("/manifest.json"), url("/images/default-avatar.png")];

        let report = store.initialize(&network, &assets).await.unwrap();

        assert_eq!(report.cached.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().any(|f| f.url.ends_with("/manifest.json") && f.reason.contains("404")));
        assert!(store.match_url(&url("/index.html")).await.unwrap().is_some());
        assert!(store.match_url(&url("/manifest.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_creates_partition_even_if_everything_fails() {
        let store = store().await;
        let network = AssetServer { missing: vec![], unreachable: vec!["/"] };

        let report = store.initialize(&network, &[url("/")]).await.unwrap();

        assert!(report.cached.is_empty());
        assert_eq!(store.db().partition_names().await.unwrap(), vec!["musicasua-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_deletes_only_stale_partitions() {
        let store = store().await;
        let db = store.db();
        db.open_partition("musicasua-v1", PartitionPurpose::Static).await.unwrap();
        db.open_partition("musicasua-dynamic-v1", PartitionPurpose::Dynamic)
            .await
            .unwrap();
        db.open_partition("musicasua-v2", PartitionPurpose::Static).await.unwrap();
        db.open_partition("musicasua-dynamic-v2", PartitionPurpose::Dynamic)
            .await
            .unwrap();
        let request = WorkerRequest::get(url("/index.html"));
        store
            .put(PartitionPurpose::Static, &request, &WorkerResponse::new(200, "shell"))
            .await
            .unwrap();

        let report = store.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["musicasua-v1".to_string(), "musicasua-dynamic-v1".to_string()]);
        assert_eq!(report.kept, vec!["musicasua-v2".to_string(), "musicasua-dynamic-v2".to_string()]);
        assert!(store.get(PartitionPurpose::Static, &request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activate_deletes_unrelated_names() {
        let store = store().await;
        store
            .db()
            .open_partition("workbox-precache", PartitionPurpose::Static)
            .await
            .unwrap();

        let report = store.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["workbox-precache".to_string()]);
    }

    #[tokio::test]
    async fn test_put_skips_non_200() {
        let store = store().await;
        let request = WorkerRequest::get(url("/api/songs/42"));

        let stored = store
            .put(PartitionPurpose::Dynamic, &request, &WorkerResponse::new(500, "boom"))
            .await
            .unwrap();

        assert!(!stored);
        assert!(store.get(PartitionPurpose::Dynamic, &request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_skips_non_get() {
        let store = store().await;
        let request = WorkerRequest::get(url("/api/favorites")).with_method("POST");

        let stored = store
            .put(PartitionPurpose::Dynamic, &request, &WorkerResponse::new(200, "{}"))
            .await
            .unwrap();
        assert!(!stored);
    }

    #[tokio::test]
    async fn test_get_is_partition_scoped() {
        let store = store().await;
        let request = WorkerRequest::get(url("/api/songs/42"));
        store
            .put(PartitionPurpose::Dynamic, &request, &WorkerResponse::new(200, "{}"))
            .await
            .unwrap();

        assert!(store.get(PartitionPurpose::Static, &request).await.unwrap().is_none());
        let hit = store.get(PartitionPurpose::Dynamic, &request).await.unwrap().unwrap();
        assert_eq!(hit.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_an_error() {
        let store = store().await.with_quota(4);
        let request = WorkerRequest::get(url("/static/app.js"));

        let result = store
            .put(PartitionPurpose::Static, &request, &WorkerResponse::new(200, "console.log(1)"))
            .await;
        assert!(matches!(result, Err(Error::QuotaExceeded { .. })));
    }
}
