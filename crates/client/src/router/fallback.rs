//! Responses the worker synthesizes when both network and cache miss.

use ouca_core::WorkerResponse;

/// 503 with the offline JSON body API callers expect.
pub fn offline_api() -> WorkerResponse {
    WorkerResponse::json(503, &serde_json::json!({ "error": "Offline", "message": "Você está offline" }))
}

/// Empty 503 for uncached navigations and remote resources.
pub fn unavailable() -> WorkerResponse {
    WorkerResponse::empty(503)
}

/// Empty 404 for assets without a placeholder.
pub fn not_found() -> WorkerResponse {
    WorkerResponse::empty(404)
}
