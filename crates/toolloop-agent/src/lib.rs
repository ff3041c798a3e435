//! Toolloop Agent — the reasoning ⇄ acting engine.
//!
//! This crate contains:
//! - **tools**: Tool trait, registry, executor and the built-in catalog (search, wiki, weather)
//! - **context**: System directive and per-call message list construction
//! - **reasoning**: One model invocation over the session history
//! - **stream**: Fragment aggregation for streamed answers
//! - **orchestrator**: The turn state machine

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod reasoning;
pub mod sink;
pub mod stream;
pub mod tools;

#[cfg(test)]
mod testing;

pub use context::ContextBuilder;
pub use error::{TurnError, TurnFailure};
pub use orchestrator::{Orchestrator, OrchestratorConfig, StopReason, TurnOutcome};
pub use reasoning::{ReasoningStep, StreamedTurn};
pub use sink::{NullSink, TurnEvent, TurnSink};
pub use stream::StreamAggregator;
pub use tools::{Tool, ToolExecutor, ToolRegistry};
