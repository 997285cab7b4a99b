//! The network seam used by the cache store and router.

use async_trait::async_trait;

use crate::Error;
use crate::exchange::{WorkerRequest, WorkerResponse};

/// Something that can perform a real network fetch.
///
/// Implementations return `Ok` for any HTTP response, whatever its status,
/// and `Err` only when no response could be obtained.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &WorkerRequest) -> Result<WorkerResponse, Error>;
}
