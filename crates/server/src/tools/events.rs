//! worker_sync and worker_push tools.

use ouca_client::{Notification, SyncOutcome, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync registration tag, e.g. "sync-downloads".
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SyncOutput {
    pub tag: String,
    pub outcome: SyncOutcome,
}

/// Parameters for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Raw push payload text: JSON with `title` and `body`.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PushOutput {
    /// Notification to show; absent when the push carried no data.
    pub notification: Option<Notification>,
}

pub fn sync_impl(worker: &Worker, params: SyncParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_sync(&params.tag);
    json_result(&SyncOutput { tag: params.tag, outcome })
}

pub fn push_impl(worker: &Worker, params: PushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.payload.as_deref())?;
    json_result(&PushOutput { notification })
}
