//! LLM provider trait: the seam between the orchestrator and a model backend.
//!
//! The `HttpProvider` in `http_provider.rs` covers every OpenAI-compatible
//! API. Tests plug in scripted providers behind the same trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use toolloop_core::error::ModelError;
use toolloop_core::types::{LlmResponse, Message, ToolCall, ToolDefinition};

/// Configuration passed to each LLM call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}

/// One item of a streamed reply.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamDelta {
    /// A text fragment, in arrival order.
    Text(String),
    /// Tool calls requested after the text started. Always the last item.
    ToolCalls(Vec<ToolCall>),
}

/// Items of a streamed reply, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamDelta, ModelError>> + Send>>;

/// Result of a streaming call, decided from the first meaningful delta.
pub enum ChatStream {
    /// The model asked for tools before saying anything; the call is
    /// already fully read.
    ToolCalls(Vec<ToolCall>),
    /// The model started with text. Fragments arrive as they are produced;
    /// a preamble followed by a tool request ends with
    /// [`StreamDelta::ToolCalls`].
    Text(FragmentStream),
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatStream::ToolCalls(calls) => f.debug_tuple("ToolCalls").field(calls).finish(),
            ChatStream::Text(_) => f.debug_tuple("Text").field(&"<stream>").finish(),
        }
    }
}

impl From<LlmResponse> for ChatStream {
    /// Adapt an atomic response: tool calls pass through, text becomes a
    /// single fragment (or none when the answer is empty).
    fn from(response: LlmResponse) -> Self {
        if response.has_tool_calls() {
            return ChatStream::ToolCalls(response.tool_calls);
        }
        let fragments: Vec<Result<StreamDelta, ModelError>> = response
            .content
            .filter(|text| !text.is_empty())
            .map(|text| Ok(StreamDelta::Text(text)))
            .into_iter()
            .collect();
        ChatStream::Text(Box::pin(stream::iter(fragments)))
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the whole response.
    ///
    /// # Arguments
    /// * `messages` — Conversation history in OpenAI format.
    /// * `tools`    — Optional list of tool definitions the LLM can call.
    /// * `model`    — Model identifier (e.g. `"gpt-4o-mini"`).
    /// * `config`   — Temperature, max_tokens, etc.
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ModelError>;

    /// Streaming variant of [`chat`](Self::chat).
    ///
    /// Backends without native streaming get this default, which performs an
    /// atomic call and replays its text as one fragment.
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<ChatStream, ModelError> {
        let response = self.chat(messages, tools, model, config).await?;
        Ok(ChatStream::from(response))
    }

    /// The default model for this provider instance.
    fn default_model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
