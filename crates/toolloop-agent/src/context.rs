//! Context builder: the system directive and the per-call message list.
//!
//! The directive is built once when the orchestrator is constructed and is
//! never stored in the session; it is prepended to the history on every
//! reasoning call.

use chrono::Utc;
use toolloop_core::types::Message;

// ─────────────────────────────────────────────
// Context builder
// ─────────────────────────────────────────────

/// Builds the system directive for the reasoning step.
pub struct ContextBuilder {
    /// Assistant name used in the identity block.
    agent_name: String,
    /// Names of the tools the model may call.
    tool_names: Vec<String>,
    /// Acting cycles allowed per turn, stated in the directive.
    max_tool_iterations: u32,
    /// Replaces the built-in directive when set.
    custom_prompt: Option<String>,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(agent_name: impl Into<String>, tool_names: Vec<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            tool_names,
            max_tool_iterations: 4,
            custom_prompt: None,
        }
    }

    /// State a different per-turn tool cap in the directive (builder pattern).
    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Use `prompt` verbatim instead of the built-in directive.
    pub fn with_custom_prompt(mut self, prompt: Option<String>) -> Self {
        self.custom_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    // ────────────── System prompt ──────────────

    /// Build the full system directive.
    pub fn build_system_prompt(&self) -> String {
        if let Some(custom) = &self.custom_prompt {
            return custom.clone();
        }

        let now = Utc::now().format("%Y-%m-%d %H:%M UTC");
        let tools = if self.tool_names.is_empty() {
            "none".to_string()
        } else {
            self.tool_names
                .iter()
                .map(|t| format!("`{t}`"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "# Identity\n\n\
             You are **{name}**, a factual, helpful assistant.\n\n\
             - **Date/time**: {now}\n\
             - **Tools**: {tools}\n\n\
             Use the web search, Wikipedia and weather tools as needed. \
             Do NOT use tools more than {max} times for a single question. \
             After using tools, summarize and answer clearly.\n\n\
             Whenever you include facts from tools, cite them as markdown links: \
             [source name](URL).\n\n\
             If a tool fails or reports that data is unavailable, tell the user \
             plainly instead of guessing.",
            name = self.agent_name,
            max = self.max_tool_iterations,
        )
    }

    // ────────────── Message building ──────────────

    /// Message list for one model call: the directive, then the history.
    pub fn build_messages(directive: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(directive));
        messages.extend_from_slice(history);
        messages
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
