//! worker_install, worker_activate and worker_message tools.

use ouca_client::{Worker, WorkerState};
use ouca_core::cache::{ActivateReport, InstallReport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InstallOutput {
    pub state: WorkerState,
    /// Whether install went straight on to activation.
    pub skip_waiting: bool,
    pub clients_claimed: bool,
    /// Precache URLs stored and the ones that failed.
    pub report: InstallReport,
    /// Partitions deleted and kept, when the worker activated.
    pub activation: Option<ActivateReport>,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActivateOutput {
    pub state: WorkerState,
    pub clients_claimed: bool,
    /// Partitions deleted and kept.
    pub report: ActivateReport,
}

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// The posted message, e.g. `{"type": "SKIP_WAITING"}`.
    pub message: serde_json::Value,
}

/// Output from the worker_message tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MessageOutput {
    pub state: WorkerState,
    /// Whether the message activated the worker.
    pub activated: bool,
    pub report: Option<ActivateReport>,
}

pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let outcome = worker.install().await?;
    json_result(&InstallOutput {
        state: worker.state(),
        skip_waiting: outcome.skip_waiting,
        clients_claimed: worker.clients_claimed(),
        report: outcome.report,
        activation: outcome.activation,
    })
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&ActivateOutput { state: worker.state(), clients_claimed: worker.clients_claimed(), report })
}

pub async fn message_impl(worker: &Worker, params: MessageParams) -> Result<CallToolResult, McpError> {
    let report = worker.handle_message(&params.message).await?;
    json_result(&MessageOutput { state: worker.state(), activated: report.is_some(), report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::tools::result_json;

    #[tokio::test]
    async fn test_install_reports_cached_assets() {
        let (worker, _) = testing::worker().await;

        let result = install_impl(&worker).await.unwrap();
        let output = result_json(&result);

        assert_eq!(output["state"], "activated");
        assert_eq!(output["skip_waiting"], true);
        assert_eq!(output["clients_claimed"], true);
        assert_eq!(output["report"]["cached"].as_array().unwrap().len(), 5);
        assert_eq!(output["report"]["failed"].as_array().unwrap().len(), 0);
        assert_eq!(output["activation"]["kept"], serde_json::json!(["musicasua-v2"]));
    }

    #[tokio::test]
    async fn test_install_waits_without_skip_waiting() {
        let (worker, _) = testing::waiting_worker().await;

        let output = result_json(&install_impl(&worker).await.unwrap());

        assert_eq!(output["state"], "installed");
        assert_eq!(output["skip_waiting"], false);
        assert_eq!(output["clients_claimed"], false);
        assert!(output["activation"].is_null());
    }

    #[tokio::test]
    async fn test_activate_before_install_is_error() {
        let (worker, _) = testing::worker().await;

        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
    }

    #[tokio::test]
    async fn test_activate_claims_clients() {
        let (worker, _) = testing::waiting_worker().await;
        install_impl(&worker).await.unwrap();

        let output = result_json(&activate_impl(&worker).await.unwrap());

        assert_eq!(output["state"], "activated");
        assert_eq!(output["clients_claimed"], true);
        assert_eq!(output["report"]["kept"], serde_json::json!(["musicasua-v2"]));
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let (worker, _) = testing::waiting_worker().await;
        install_impl(&worker).await.unwrap();

        let params = MessageParams { message: serde_json::json!({ "type": "SKIP_WAITING" }) };
        let output = result_json(&message_impl(&worker, params).await.unwrap());

        assert_eq!(output["activated"], true);
        assert_eq!(output["state"], "activated");
    }

    #[tokio::test]
    async fn test_unknown_message_ignored() {
        let (worker, _) = testing::waiting_worker().await;
        install_impl(&worker).await.unwrap();

        let params = MessageParams { message: serde_json::json!({ "type": "PING" }) };
        let output = result_json(&message_impl(&worker, params).await.unwrap());

        assert_eq!(output["activated"], false);
        assert_eq!(output["state"], "installed");
        assert!(output["report"].is_null());
    }
}
