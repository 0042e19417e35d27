//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ActivationReport, Agent, InstallReport, LifecycleState};

use super::json_result;

/// Output structure for sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub report: InstallReport,
    /// State after install; `active` when skip-waiting is set.
    pub state: LifecycleState,
}

/// Output structure for sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub report: ActivationReport,
    pub state: LifecycleState,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.on_install().await?;
    json_result(&SwInstallOutput { report, state: agent.state() })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.on_activate().await?;
    json_result(&SwActivateOutput { report, state: agent.state() })
}
