//! cache_partitions tool implementation.
//!
//! Lists every stored partition with its entry count and size.

use ouca_client::Worker;
use ouca_core::cache::PartitionInfo;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use crate::tools::json_result;

/// Output from the cache_partitions tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CachePartitionsOutput {
    /// Current static partition name.
    pub static_cache: String,
    /// Current dynamic partition name.
    pub dynamic_cache: String,
    /// All partitions on disk, oldest first.
    pub partitions: Vec<PartitionInfo>,
}

/// Implementation of the cache_partitions tool.
pub async fn partitions_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let store = worker.store();
    let partitions = store.db().partitions().await?;

    json_result(&CachePartitionsOutput {
        static_cache: store.versions().static_name().to_string(),
        dynamic_cache: store.versions().dynamic_name().to_string(),
        partitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ORIGIN};
    use crate::tools::result_json;
    use ouca_core::WorkerRequest;
    use url::Url;

    #[tokio::test]
    async fn test_partitions_empty_before_install() {
        let (worker, _) = testing::worker().await;

        let output = result_json(&partitions_impl(&worker).await.unwrap());

        assert_eq!(output["static_cache"], "musicasua-v2");
        assert_eq!(output["dynamic_cache"], "musicasua-dynamic-v2");
        assert!(output["partitions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partitions_after_traffic() {
        let (worker, network) = testing::worker().await;
        worker.install().await.unwrap();
        network.ok(&format!("{ORIGIN}/api/songs"), "[1]");
        worker
            .handle_fetch(&WorkerRequest::get(Url::parse(&format!("{ORIGIN}/api/songs")).unwrap()))
            .await;

        let output = result_json(&partitions_impl(&worker).await.unwrap());
        let partitions = output["partitions"].as_array().unwrap();

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0]["name"], "musicasua-v2");
        assert_eq!(partitions[0]["purpose"], "static");
        assert_eq!(partitions[0]["entry_count"], 5);
        assert_eq!(partitions[1]["name"], "musicasua-dynamic-v2");
        assert_eq!(partitions[1]["entry_count"], 1);
    }
}
