//! Test fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ouca_client::Worker;
use ouca_core::{AppConfig, CacheDb, Error, Network, WorkerRequest, WorkerResponse};

pub const ORIGIN: &str = "http://localhost:3000";

/// Network that answers from a URL table and can be taken offline.
#[derive(Default)]
pub struct FakeNetwork {
    replies: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn ok(&self, url: &str, body: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), (200, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("fake offline".into()));
        }
        let (status, body) = self
            .replies
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(WorkerResponse::new(status, bytes::Bytes::from(body)))
    }
}

/// A worker over an in-memory cache with every precache asset reachable.
pub async fn worker() -> (Arc<Worker>, Arc<FakeNetwork>) {
    worker_with(AppConfig::default()).await
}

/// Like [`worker`], but it stays installed until told to activate.
pub async fn waiting_worker() -> (Arc<Worker>, Arc<FakeNetwork>) {
    worker_with(AppConfig { skip_waiting_on_install: false, ..AppConfig::default() }).await
}

async fn worker_with(config: AppConfig) -> (Arc<Worker>, Arc<FakeNetwork>) {
    let network = Arc::new(FakeNetwork::default());
    for path in &config.precache {
        network.ok(&format!("{ORIGIN}{path}"), path);
    }
    let db = CacheDb::open_in_memory().await.unwrap();
    let worker = Worker::from_config(&config, db, network.clone()).unwrap();
    (Arc::new(worker), network)
}
