//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the caching agent and its store.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, buckets_impl, get_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};
use crate::tools::sw_lifecycle::{activate_impl, install_impl};
use crate::tools::sw_message::{SwMessageParams, message_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::Agent;
use swcache_core::{AppConfig, CacheStore};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    agent: Arc<Agent>,
    store: Arc<dyn CacheStore>,
    config: Arc<AppConfig>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SwCacheServer {
    /// Create a server over an agent and the store it writes to.
    pub fn new(agent: Arc<Agent>, store: Arc<dyn CacheStore>, config: Arc<AppConfig>) -> Self {
        Self { agent, store, config, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Route a request through the caching agent. Returns the chosen route, where the response came from (network, cache, offline, synthetic), and the response."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, params.0).await
    }

    #[tool(description = "Precache the asset manifest into the current static bucket. Activates too when skip-waiting is set.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.agent).await
    }

    #[tool(description = "Activate the installed version: delete stale buckets and start intercepting requests.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.agent).await
    }

    #[tool(description = "Send a control message: {\"type\":\"FORCE_ACTIVATE\"} or {\"type\":\"CACHE_URLS\",\"urls\":[...]}.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.agent, params.0).await
    }

    #[tool(description = "List cache buckets in creation order with entry counts.")]
    async fn cache_buckets(&self) -> Result<CallToolResult, McpError> {
        buckets_impl(self.store.as_ref(), &self.config).await
    }

    #[tool(description = "Read a stored response by URL, from one bucket or matched across all buckets.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.store.as_ref(), &self.config, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Offline cache for {} (version {}). Use sw_fetch to route requests through the agent.",
                self.config.origin, self.config.cache_version
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
