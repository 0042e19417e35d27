//! MCP tool implementations.
//!
//! Each tool has a plain `*_impl` function taking the agent or the store,
//! so it can be exercised without an MCP session.

pub mod cache;
pub mod sw_fetch;
pub mod sw_lifecycle;
pub mod sw_message;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Response;

use crate::error::ServerError;

/// A response rendered for a tool result.
///
/// Bodies are decoded lossily as UTF-8; `body_bytes` is the stored length.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseOutput {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_bytes: usize,
}

impl From<&Response> for ResponseOutput {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

/// Serialize `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ServerError::Encode(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Decode the JSON text of a successful tool result.
#[cfg(test)]
pub(crate) fn parse_result<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_output_decodes_body() {
        let response = Response::new(200, "a{}").with_header("content-type", "text/css");
        let output = ResponseOutput::from(&response);
        assert_eq!(output.body, "a{}");
        assert_eq!(output.body_bytes, 3);
        assert_eq!(output.headers, vec![("content-type".to_string(), "text/css".to_string())]);
    }

    #[test]
    fn test_json_result_round_trips() {
        let output = ResponseOutput::from(&Response::service_unavailable());
        let result = json_result(&output).unwrap();
        let parsed: ResponseOutput = parse_result(&result);
        assert_eq!(parsed.status, 503);
        assert!(parsed.body.is_empty());
    }
}
