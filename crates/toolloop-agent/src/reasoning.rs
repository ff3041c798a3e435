//! Reasoning step: one model invocation over the current history.
//!
//! The system directive is prepended for the call only. The step never
//! touches the session and never retries; a provider failure is returned
//! as a `ModelError` for the orchestrator to surface.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::StreamExt;
use tracing::debug;

use toolloop_core::error::ModelError;
use toolloop_core::types::{AssistantTurn, Message, ToolCall, ToolDefinition};
use toolloop_providers::{ChatStream, FragmentStream, LlmProvider, LlmRequestConfig, StreamDelta};

use crate::context::ContextBuilder;

/// Streaming counterpart of [`AssistantTurn`].
pub enum StreamedTurn {
    /// Tool calls to run before reasoning again.
    ToolRequest(Vec<ToolCall>),
    /// Streamed text, normally the final answer. A trailing
    /// [`StreamDelta::ToolCalls`] turns it into a tool request.
    Text(FragmentStream),
}

impl std::fmt::Debug for StreamedTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamedTurn::ToolRequest(calls) => f.debug_tuple("ToolRequest").field(calls).finish(),
            StreamedTurn::Text(_) => f.debug_tuple("Text").field(&"<stream>").finish(),
        }
    }
}

/// Invokes the model with the tool catalog attached.
pub struct ReasoningStep {
    provider: Arc<dyn LlmProvider>,
    model: String,
    request: LlmRequestConfig,
    tools: Vec<ToolDefinition>,
}

impl ReasoningStep {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        request: LlmRequestConfig,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            request,
            tools,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn tool_slice(&self) -> Option<&[ToolDefinition]> {
        (!self.tools.is_empty()).then_some(self.tools.as_slice())
    }

    /// Ask the model for the next assistant turn.
    pub async fn invoke(
        &self,
        directive: &str,
        history: &[Message],
    ) -> Result<AssistantTurn, ModelError> {
        let messages = ContextBuilder::build_messages(directive, history);
        debug!(
            provider = self.provider.display_name(),
            model = %self.model,
            messages = messages.len(),
            "reasoning step"
        );

        let response = self
            .provider
            .chat(&messages, self.tool_slice(), &self.model, &self.request)
            .await?;

        Ok(match response.into_turn() {
            AssistantTurn::ToolRequest(calls) => AssistantTurn::ToolRequest(assign_call_ids(calls)),
            done => done,
        })
    }

    /// Like [`invoke`](Self::invoke), but text comes back as a lazy
    /// fragment stream. Tool calls requested after a text preamble arrive as
    /// the stream's last item, with ids already assigned.
    pub async fn invoke_streaming(
        &self,
        directive: &str,
        history: &[Message],
    ) -> Result<StreamedTurn, ModelError> {
        let messages = ContextBuilder::build_messages(directive, history);
        debug!(
            provider = self.provider.display_name(),
            model = %self.model,
            messages = messages.len(),
            "reasoning step (streaming)"
        );

        let stream = self
            .provider
            .chat_stream(&messages, self.tool_slice(), &self.model, &self.request)
            .await?;

        Ok(match stream {
            ChatStream::ToolCalls(calls) => StreamedTurn::ToolRequest(assign_call_ids(calls)),
            ChatStream::Text(fragments) => StreamedTurn::Text(Box::pin(fragments.map(|item| {
                item.map(|delta| match delta {
                    StreamDelta::ToolCalls(calls) => StreamDelta::ToolCalls(assign_call_ids(calls)),
                    text => text,
                })
            }))),
        })
    }
}

/// Replace empty or repeated ids with `call_<index>` so every result can be
/// paired with exactly one call.
fn assign_call_ids(mut calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    for (index, call) in calls.iter_mut().enumerate() {
        if call.id.is_empty() || seen.contains(&call.id) {
            let mut id = format!("call_{index}");
            let mut suffix = 1;
            while seen.contains(&id) {
                id = format!("call_{index}_{suffix}");
                suffix += 1;
            }
            debug!(tool = %call.name, old_id = %call.id, new_id = %id, "assigned tool call id");
            call.id = id;
        }
        seen.insert(call.id.clone());
    }
    calls
}
