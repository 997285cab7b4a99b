//! worker_fetch tool implementation.
//!
//! Delivers a fetch event to the worker. Requests the worker declines to
//! intercept are fetched directly, the way the browser would.

use std::collections::BTreeMap;

use ouca_client::{RouteClass, RouteOutcome, Worker, resolve};
use ouca_core::{Error, RequestMode, ResponseSource, WorkerRequest, WorkerResponse};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode as the page reported it (default: cors).
    #[serde(default)]
    pub mode: RequestMode,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    /// How the request was classified.
    pub class: RouteClass,
    /// Whether the worker answered the request itself.
    pub intercepted: bool,
    pub status: u16,
    /// Network, cache or synthesized.
    pub source: ResponseSource,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: FetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, params)?;

    let (class, intercepted, response) = match worker.handle_fetch(&request).await {
        RouteOutcome::Respond { class, response } => (class, true, response),
        RouteOutcome::Passthrough(class) => {
            tracing::debug!(url = %request.url, %class, "passing request through");
            (class, false, worker.network().fetch(&request).await?)
        }
    };

    json_result(&to_output(&request, class, intercepted, response))
}

fn build_request(worker: &Worker, params: FetchParams) -> Result<WorkerRequest, Error> {
    let url = resolve(&worker.router().rules().origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = WorkerRequest::get(url)
        .with_method(&params.method)
        .with_mode(params.mode);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

fn to_output(request: &WorkerRequest, class: RouteClass, intercepted: bool, response: WorkerResponse) -> FetchOutput {
    FetchOutput {
        url: request.url.to_string(),
        class,
        intercepted,
        status: response.status,
        source: response.source,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        headers: response.headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ORIGIN};
    use crate::tools::result_json;

    fn params(url: &str) -> FetchParams {
        FetchParams {
            url: url.to_string(),
            method: default_method(),
            mode: RequestMode::default(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    async fn active_worker() -> (std::sync::Arc<Worker>, std::sync::Arc<testing::FakeNetwork>) {
        let (worker, network) = testing::worker().await;
        worker.install().await.unwrap();
        (worker, network)
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let (worker, network) = testing::worker().await;
        network.ok(&format!("{ORIGIN}/api/songs"), "[]");

        let output = result_json(&fetch_impl(&worker, params("/api/songs")).await.unwrap());

        assert_eq!(output["intercepted"], false);
        assert_eq!(output["class"], "api");
        assert_eq!(output["status"], 200);
        assert_eq!(output["source"], "network");
    }

    #[tokio::test]
    async fn test_fetch_offline_api() {
        let (worker, network) = active_worker().await;
        network.set_offline(true);

        let output = result_json(&fetch_impl(&worker, params("/api/songs/1")).await.unwrap());

        assert_eq!(output["intercepted"], true);
        assert_eq!(output["status"], 503);
        assert_eq!(output["source"], "synthesized");
        assert_eq!(output["content_type"], "application/json");
        let body: serde_json::Value = serde_json::from_str(output["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["message"], "Você está offline");
    }

    #[tokio::test]
    async fn test_fetch_navigation_offline_serves_shell() {
        let (worker, network) = active_worker().await;
        network.set_offline(true);
        let mut p = params("/album/12");
        p.mode = RequestMode::Navigate;

        let output = result_json(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(output["class"], "navigation");
        assert_eq!(output["status"], 200);
        assert_eq!(output["source"], "cache");
        assert_eq!(output["body"], "/index.html");
    }

    #[tokio::test]
    async fn test_fetch_post_passthrough_offline_is_error() {
        let (worker, network) = active_worker().await;
        network.set_offline(true);
        let mut p = params("/api/favorites");
        p.method = "POST".into();
        p.body = Some("{\"song\":1}".into());

        let err = fetch_impl(&worker, p).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let (worker, _) = active_worker().await;

        let err = fetch_impl(&worker, params("ftp://example.com/file")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
