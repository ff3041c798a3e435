//! toolloop core: message types, error taxonomy, session state, config.
//!
//! Every other crate in the workspace builds on these types:
//! - **types**: chat messages, tool calls and the OpenAI wire format
//! - **error**: `ModelError` and `ToolError`
//! - **session**: the append-only `SessionState`
//! - **config**: JSON config file + env overrides

pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod utils;

pub use error::{ModelError, ToolError};
pub use session::SessionState;
pub use types::{AssistantTurn, LlmResponse, Message, ToolCall, ToolDefinition};
