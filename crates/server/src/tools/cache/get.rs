//! cache_get tool implementation.
//!
//! Reads one stored response, from a named bucket or by matching across all
//! buckets the way the agent does.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::canonicalize;
use swcache_core::{AppConfig, CacheStore, Error};
use url::Url;

use crate::tools::{ResponseOutput, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or origin-relative path of the entry.
    pub url: String,

    /// Bucket to read; omit to match across all buckets.
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// Canonical URL used as the key.
    pub url: String,
    pub bucket: Option<String>,
    pub response: ResponseOutput,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    store: &dyn CacheStore, config: &AppConfig, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
    let url = canonicalize(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = url.as_str();

    let response = match &params.bucket {
        Some(bucket) => store.get(bucket, key).await?,
        None => store.lookup(key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    json_result(&CacheGetOutput {
        url: url.to_string(),
        bucket: params.bucket,
        response: ResponseOutput::from(&response),
    })
}
