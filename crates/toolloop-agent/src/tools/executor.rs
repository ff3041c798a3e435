//! Tool executor: runs one step's batch of tool calls.
//!
//! Each call is validated against the registry, then run on its own task
//! under a per-call timeout. Calls of a batch run concurrently up to a
//! limit, and results come back in request order whatever order they
//! finish in. Every failure is turned into a `ToolResult` carrying a
//! `ToolError`; nothing here fails the turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{info, warn};

use toolloop_core::config::ToolsConfig;
use toolloop_core::error::ToolError;
use toolloop_core::types::{Message, ToolCall, ToolDefinition};
use toolloop_core::utils::truncate_string;

use super::base::{Tool, ToolArgs};
use super::registry::ToolRegistry;

/// Executor limits.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Wall-clock limit for a single call.
    pub timeout: Duration,
    /// Calls of one batch allowed to run at the same time.
    pub max_concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrency: 4,
        }
    }
}

impl From<&ToolsConfig> for ExecutorConfig {
    fn from(config: &ToolsConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_concurrency: config.max_concurrency,
        }
    }
}

// ─────────────────────────────────────────────
// ToolResult
// ─────────────────────────────────────────────

/// Outcome of one tool call, tied to the call that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub outcome: Result<Value, ToolError>,
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Text the model reads: strings verbatim, other values as JSON, errors
    /// as a structured `{"error": {...}}` object.
    pub fn payload(&self) -> String {
        match &self.outcome {
            Ok(Value::String(text)) => text.clone(),
            Ok(value) => value.to_string(),
            Err(e) => e.to_payload().to_string(),
        }
    }

    /// History entry answering the originating call.
    pub fn to_message(&self) -> Message {
        Message::tool_result(self.tool_call_id.clone(), self.payload())
    }
}

// ─────────────────────────────────────────────
// ToolExecutor
// ─────────────────────────────────────────────

/// Runs batches of tool calls against a fixed registry.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, config: ExecutorConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// The catalog this executor dispatches to.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Definitions advertised to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Execute a batch. The i-th result answers the i-th call.
    pub async fn execute(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }
        let limit = self.config.max_concurrency.max(1);
        stream::iter(calls)
            .map(|call| self.execute_one(call))
            .buffered(limit)
            .collect()
            .await
    }

    async fn execute_one(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let outcome = match self.registry.validate(&call.name, &call.arguments) {
            Ok((tool, args)) => self.run(tool, args).await,
            Err(e) => Err(e),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let args_preview = truncate_string(&call.arguments.to_string(), 200);
        match &outcome {
            Ok(_) => info!(
                tool = %call.name,
                call_id = %call.id,
                ok = true,
                duration_ms,
                args = %args_preview,
                "tool call finished"
            ),
            Err(e) => warn!(
                tool = %call.name,
                call_id = %call.id,
                ok = false,
                outcome = e.kind(),
                error = %e,
                duration_ms,
                args = %args_preview,
                "tool call failed"
            ),
        }

        ToolResult {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            outcome,
        }
    }

    /// Run on a separate task so a panic is contained. A task that outlives
    /// its timeout is aborted; one whose caller goes away is left detached.
    async fn run(&self, tool: Arc<dyn Tool>, args: ToolArgs) -> Result<Value, ToolError> {
        let limit = self.config.timeout;
        let mut handle = tokio::spawn(async move { tool.execute(&args).await });

        match timeout(limit, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(ToolError::Execution("tool panicked".to_string()))
            }
            Ok(Err(join_err)) => Err(ToolError::Execution(join_err.to_string())),
            Err(_) => {
                handle.abort();
                Err(ToolError::Timeout(limit))
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
