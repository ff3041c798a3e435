//! Decoding of streamed chat completion events.
//!
//! OpenAI-compatible APIs send one `data:` line per `chat.completion.chunk`
//! and finish with `data: [DONE]`. Tool calls arrive split over several
//! chunks, keyed by `index`, and are stitched back together here.

use std::collections::BTreeMap;

use serde_json::Value;
use toolloop_core::error::ModelError;
use toolloop_core::types::{decode_arguments, ChatCompletionChunk, ToolCall, ToolCallDelta};

/// Data line that closes an OpenAI stream.
pub const DONE_MARKER: &str = "[DONE]";

/// One decoded `data:` payload.
#[derive(Debug)]
pub enum SseEvent {
    Chunk(ChatCompletionChunk),
    Done,
}

/// Decode the data of one SSE event.
///
/// Blank payloads (keep-alives) decode to an empty chunk. An `error` object
/// in the payload is reported as a stream failure.
pub fn parse_event_data(data: &str) -> Result<SseEvent, ModelError> {
    let data = data.trim();
    if data == DONE_MARKER {
        return Ok(SseEvent::Done);
    }
    if data.is_empty() {
        return Ok(SseEvent::Chunk(ChatCompletionChunk {
            choices: Vec::new(),
        }));
    }

    let json: Value = serde_json::from_str(data)
        .map_err(|e| ModelError::Decode(format!("SSE parsing error: {e}, data: {data}")))?;

    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or("an error occurred during streaming");
        return Err(ModelError::Stream(message.to_string()));
    }

    serde_json::from_value(json)
        .map(SseEvent::Chunk)
        .map_err(|e| ModelError::Decode(format!("SSE chunk schema error: {e}")))
}

// ─────────────────────────────────────────────
// Tool call accumulation
// ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Collects tool call deltas until the stream ends.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    partials: BTreeMap<usize, PartialCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the deltas of one chunk.
    pub fn push(&mut self, deltas: &[ToolCallDelta]) {
        for delta in deltas {
            let partial = self.partials.entry(delta.index).or_default();
            if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
                partial.id = id.to_string();
            }
            if let Some(function) = &delta.function {
                if let Some(name) = function.name.as_deref() {
                    partial.name.push_str(name);
                }
                if let Some(arguments) = function.arguments.as_deref() {
                    partial.arguments.push_str(arguments);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Finished calls, ordered by their stream index.
    pub fn finish(self) -> Vec<ToolCall> {
        self.partials
            .into_values()
            .map(|p| ToolCall::new(p.id, p.name, decode_arguments(&p.arguments)))
            .collect()
    }
}
