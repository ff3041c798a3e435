//! Streamed answer aggregation.
//!
//! A streaming reasoning call hands back a lazy stream of text fragments.
//! `StreamAggregator` folds them into the final text, and `drain` pumps a
//! stream through an aggregator while forwarding every fragment to the sink.
//! A stream that ends with tool calls was a preamble, not an answer.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use toolloop_core::types::AssistantTurn;
use toolloop_providers::{FragmentStream, StreamDelta};

use crate::error::TurnError;
use crate::sink::{TurnEvent, TurnSink};

/// Accumulates fragments into a monotonically growing string.
#[derive(Debug, Default)]
pub struct StreamAggregator {
    text: String,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the text so far.
    pub fn push(&mut self, fragment: &str) -> &str {
        self.text.push_str(fragment);
        &self.text
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The complete text.
    pub fn finish(self) -> String {
        self.text
    }
}

/// Consume `fragments` to exhaustion, emitting a `TextDelta` per non-empty
/// fragment. Trailing tool calls turn the call into a tool request and the
/// streamed text is dropped. Cancellation or a stream error abandons the
/// partial text.
pub async fn drain(
    mut fragments: FragmentStream,
    sink: &dyn TurnSink,
    cancel: &CancellationToken,
) -> Result<AssistantTurn, TurnError> {
    let mut aggregator = StreamAggregator::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            next = fragments.next() => next,
        };

        match next {
            None => break,
            Some(Err(e)) => return Err(TurnError::Model(e)),
            Some(Ok(StreamDelta::Text(fragment))) if fragment.is_empty() => {}
            Some(Ok(StreamDelta::Text(fragment))) => {
                let text = aggregator.push(&fragment).to_string();
                sink.on_event(TurnEvent::TextDelta { fragment, text });
            }
            Some(Ok(StreamDelta::ToolCalls(calls))) if calls.is_empty() => {}
            Some(Ok(StreamDelta::ToolCalls(calls))) => {
                debug!(
                    tool_calls = calls.len(),
                    preamble_len = aggregator.text().len(),
                    "streamed text ended in a tool request"
                );
                return Ok(AssistantTurn::ToolRequest(calls));
            }
        }
    }

    Ok(AssistantTurn::Final(aggregator.finish()))
}
