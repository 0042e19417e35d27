//! Errors raised by the host adapter itself.
//!
//! Agent and cache failures arrive as `swcache_core::Error` and convert on
//! their own; these cover request shapes the agent never sees.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid tool parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A tool result could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::InvalidInput(_) => -32602,
            ServerError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
