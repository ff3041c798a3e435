//! Error taxonomy shared by providers, tools and the orchestrator.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a model invocation. Fatal to the current turn.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// The request never got a response (connection refused, DNS, TLS, ...).
    #[error("model request failed: {0}")]
    Request(String),

    /// The request exceeded the provider timeout.
    #[error("model request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode model response: {0}")]
    Decode(String),

    /// The API answered without any choice.
    #[error("model response contained no choices")]
    EmptyResponse,

    /// A streamed response broke off or carried an error event.
    #[error("model stream failed: {0}")]
    Stream(String),

    /// The provider could not be set up (missing key, bad client config).
    #[error("model provider misconfigured: {0}")]
    Config(String),
}

/// Failure of a single tool call. Always recovered locally: the executor turns
/// it into a tool-result message the model can read.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("tool timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The tool crashed or failed for a reason that is not one of the above.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// Stable machine-readable kind, used in the tool-result payload.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "not_found",
            ToolError::InvalidArguments(_) => "invalid_arguments",
            ToolError::Network(_) => "network_error",
            ToolError::Timeout(_) => "timeout",
            ToolError::Execution(_) => "execution_error",
        }
    }

    /// Structured payload appended to the history in place of a result.
    pub fn to_payload(&self) -> Value {
        json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}
