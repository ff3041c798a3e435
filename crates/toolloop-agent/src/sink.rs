//! Presentation sink: where a turn reports its progress.
//!
//! The engine only emits notices; rendering them is the caller's business.

use tokio::sync::mpsc::UnboundedSender;

/// Progress notice emitted during a turn.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// A tool call is about to run.
    ToolInvoked { name: String, query: String },
    /// A fragment of the final answer, with the text accumulated so far.
    TextDelta { fragment: String, text: String },
    /// The turn produced its final answer. Emitted once.
    Completed { text: String },
    /// The turn failed. Emitted once, instead of `Completed`.
    Failed { message: String },
}

/// Receives turn notices. Must not block.
pub trait TurnSink: Send + Sync {
    fn on_event(&self, event: TurnEvent);
}

/// Discards every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TurnSink for NullSink {
    fn on_event(&self, _event: TurnEvent) {}
}

/// Forwards notices to a channel; a closed receiver is ignored.
impl TurnSink for UnboundedSender<TurnEvent> {
    fn on_event(&self, event: TurnEvent) {
        let _ = self.send(event);
    }
}
