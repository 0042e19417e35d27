//! sw_message tool implementation.
//!
//! Delivers a control message (`FORCE_ACTIVATE` or `CACHE_URLS`) to the agent.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{Agent, ControlMessage, ControlOutcome, LifecycleState};

use super::json_result;
use crate::error::ServerError;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// `{"type": "FORCE_ACTIVATE"}` or `{"type": "CACHE_URLS", "urls": [...]}`.
    pub message: ControlMessage,
}

/// Output structure for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub outcome: ControlOutcome,
    pub state: LifecycleState,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(agent: &Agent, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    if let ControlMessage::CacheUrls { urls } = &params.message
        && urls.is_empty()
    {
        return Err(ServerError::InvalidInput("urls cannot be empty".into()).into());
    }

    let outcome = agent.on_message(params.message).await?;
    json_result(&SwMessageOutput { outcome, state: agent.state() })
}
