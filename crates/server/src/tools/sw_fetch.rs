//! sw_fetch tool implementation.
//!
//! Routes one request through the agent, exactly as an intercepted page
//! request would be.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Agent, ResponseSource, Route};
use swcache_core::Request;

use super::{ResponseOutput, json_result};
use crate::error::ServerError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL or origin-relative path.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET bypasses the cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header; `text/html` marks a document request.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// The route the classifier chose.
    pub route: Route,
    /// Where the response came from.
    pub source: ResponseSource,
    pub response: ResponseOutput,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(agent: &Agent, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ServerError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ServerError::InvalidInput("method cannot be empty".into()).into());
    }

    let mut request = Request { method: params.method.trim().to_uppercase(), ..Request::get(params.url) };
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }
    let served = agent.handle(&request).await?;

    tracing::debug!(url = %request.url, route = ?served.route, source = ?served.source, "served");

    json_result(&SwFetchOutput {
        url: request.url,
        route: served.route,
        source: served.source,
        response: ResponseOutput::from(&served.response),
    })
}
