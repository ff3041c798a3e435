//! Session state: the append-only message log of one conversation.
//!
//! The orchestrator takes a `SessionState` by value for the duration of a
//! turn and hands it back afterwards. Nothing else holds it, and there is no
//! API to edit, reorder or remove an entry once it has been pushed.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Ordered, append-only conversation log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState {
    messages: Vec<Message>,
}

impl SessionState {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a log the caller kept (for example one it persisted).
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message at the end of the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append several messages, preserving their order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Read-only view of the log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Text of the most recent assistant message that has text.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant {
                content: Some(text),
                ..
            } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Ids of tool calls that have no tool-result message after them.
    ///
    /// A well-formed log always returns an empty list.
    pub fn unanswered_tool_calls(&self) -> Vec<String> {
        let mut pending = Vec::new();
        for (index, message) in self.messages.iter().enumerate() {
            for call in message.tool_calls() {
                let answered = self.messages[index + 1..].iter().any(|m| {
                    matches!(m, Message::Tool { tool_call_id, .. } if *tool_call_id == call.id)
                });
                if !answered {
                    pending.push(call.id.clone());
                }
            }
        }
        pending
    }

    /// Give up ownership of the underlying log.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
