//! cache_buckets tool implementation.
//!
//! Lists every bucket in creation order with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, BucketName, CacheStore};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BucketSummary {
    pub name: String,
    /// `static` or `dynamic`; absent for buckets outside the namespace.
    pub role: Option<String>,
    pub version: Option<String>,
    pub entries: usize,
    /// Whether this bucket belongs to the configured cache version.
    pub current: bool,
}

/// Output from the cache_buckets tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheBucketsOutput {
    pub buckets: Vec<BucketSummary>,
}

/// Implementation of the cache_buckets tool.
pub async fn buckets_impl(store: &dyn CacheStore, config: &AppConfig) -> Result<CallToolResult, McpError> {
    let current = [config.static_bucket(), config.dynamic_bucket()];
    let mut buckets = Vec::new();

    for name in store.bucket_names().await? {
        let parsed = BucketName::parse(&name);
        let entries = store.entry_count(&name).await?;
        buckets.push(BucketSummary {
            current: parsed.as_ref().is_some_and(|p| current.contains(p)),
            role: parsed.as_ref().map(|p| p.role().to_string()),
            version: parsed.as_ref().map(|p| p.version().to_string()),
            name,
            entries,
        });
    }

    json_result(&CacheBucketsOutput { buckets })
}
