//! Tool trait: the interface every catalog entry implements.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};

use toolloop_core::error::ToolError;
use toolloop_core::types::ToolDefinition;
use toolloop_core::utils::truncate_string;

/// Validated tool arguments.
pub type ToolArgs = Map<String, Value>;

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// Every tool implements this trait.
///
/// The registry advertises tools to the model via `to_definition()`, checks
/// arguments against `parameters()`, and the executor dispatches to
/// `execute()`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used by the model to call this tool (e.g. `"get_wiki"`).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters.
    ///
    /// Must be `{"type": "object", "properties": {...}, "required": [...]}`.
    fn parameters(&self) -> Value;

    /// Execute the tool with arguments that already passed validation.
    ///
    /// Returns a JSON value for the model to read. Domain "no data" outcomes
    /// are successful values; only real failures are `Err`.
    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError>;

    /// Build the `ToolDefinition` sent to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────
// Param helpers
// ─────────────────────────────────────────────

/// Extract a required non-empty `String` param.
pub fn require_string(args: &ToolArgs, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required parameter: {key}")))
}

/// Extract an optional integer param.
pub fn optional_i64(args: &ToolArgs, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

// ─────────────────────────────────────────────
// HTTP helpers
// ─────────────────────────────────────────────

/// User-Agent sent by the HTTP-backed tools.
pub const USER_AGENT: &str = concat!("toolloop/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by one tool instance.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Map a reqwest failure onto the tool error taxonomy.
pub fn network_error(e: reqwest::Error, timeout: Duration) -> ToolError {
    if e.is_timeout() {
        ToolError::Timeout(timeout)
    } else {
        ToolError::Network(e.to_string())
    }
}

/// Send a GET request and decode the body as JSON.
///
/// The body is read as text first: some APIs label JSON with a
/// non-JSON content type.
pub async fn get_json(
    request: RequestBuilder,
    service: &str,
    timeout: Duration,
) -> Result<Value, ToolError> {
    let resp = request.send().await.map_err(|e| network_error(e, timeout))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ToolError::Network(format!(
            "{service} returned {status}: {}",
            truncate_string(&body, 200)
        )));
    }

    let text = resp.text().await.map_err(|e| network_error(e, timeout))?;
    serde_json::from_str(&text)
        .map_err(|e| ToolError::Network(format!("{service} sent an invalid response: {e}")))
}
