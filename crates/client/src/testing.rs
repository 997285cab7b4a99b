//! In-crate stub network for router and worker tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ouca_core::{Error, Network, WorkerRequest, WorkerResponse};

/// Replies from a fixed table keyed by URL; unknown URLs get 404.
/// Records every request it sees and can be switched offline.
#[derive(Default)]
pub struct StubNetwork {
    replies: Mutex<HashMap<String, WorkerResponse>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: &str, response: WorkerResponse) -> &Self {
        self.replies.lock().unwrap().insert(url.to_string(), response);
        self
    }

    pub fn ok(&self, url: &str, body: &str) -> &Self {
        self.reply(url, WorkerResponse::new(200, body.to_string()))
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == url).count()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error> {
        self.calls.lock().unwrap().push(request.url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("stub offline".into()));
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| WorkerResponse::new(404, "")))
    }
}
