//! Orchestrator: drives one turn through the reasoning ⇄ acting cycle.
//!
//! A turn starts in `Reasoning`. A tool request moves it to `Acting`; every
//! call of the batch is executed and the assistant request plus its results
//! are appended together before going back to `Reasoning`. A final answer
//! ends the turn. The acting cap bounds a turn to `cap + 1` reasoning calls:
//! a request made after `cap` acting steps is discarded and a canned reply
//! ends the turn instead.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use toolloop_core::config::{AgentConfig, Config};
use toolloop_core::session::SessionState;
use toolloop_core::types::{AssistantTurn, Message, ToolCall};
use toolloop_providers::{LlmProvider, LlmRequestConfig};

use crate::context::ContextBuilder;
use crate::error::{TurnError, TurnFailure};
use crate::reasoning::{ReasoningStep, StreamedTurn};
use crate::sink::{NullSink, TurnEvent, TurnSink};
use crate::stream::drain;
use crate::tools::{default_registry, ExecutorConfig, ToolExecutor, ToolResult};

/// Name the assistant introduces itself with.
pub const AGENT_NAME: &str = "toolloop";

/// Acting steps allowed per turn unless configured otherwise.
pub const DEFAULT_MAX_TOOL_ITERATIONS: u32 = 4;

/// Reply appended when the acting cap is reached.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't complete this request within the \
    allowed number of tool calls. Please try rephrasing or narrowing your question.";

/// Turn-level settings.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Acting steps allowed per turn.
    pub max_tool_iterations: u32,
    /// Deliver the final answer as a fragment stream.
    pub stream: bool,
    /// Replaces the built-in system directive.
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            stream: true,
            system_prompt: None,
        }
    }
}

impl From<&AgentConfig> for OrchestratorConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_tool_iterations: config.max_tool_iterations,
            stream: config.stream,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

/// How a successful turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The model gave a final answer.
    Completed,
    /// The acting cap was reached; the reply is the canned fallback.
    IterationLimit,
}

/// A completed turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    /// The session with this turn appended.
    pub session: SessionState,
    /// Final assistant text.
    pub reply: String,
    pub stop: StopReason,
    pub reasoning_calls: u32,
    pub tool_calls: usize,
}

enum Phase {
    Reasoning,
    Acting(Vec<ToolCall>),
    Done(String, StopReason),
}

#[derive(Default)]
struct TurnStats {
    reasoning_calls: u32,
    tool_calls: usize,
}

// ─────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────

/// Runs turns. Holds no per-session state, so one instance can serve any
/// number of independent sessions.
pub struct Orchestrator {
    reasoning: ReasoningStep,
    executor: ToolExecutor,
    config: OrchestratorConfig,
    /// System directive, built once.
    directive: String,
}

impl Orchestrator {
    pub fn new(reasoning: ReasoningStep, executor: ToolExecutor, config: OrchestratorConfig) -> Self {
        let directive = ContextBuilder::new(AGENT_NAME, executor.registry().tool_names())
            .with_max_tool_iterations(config.max_tool_iterations)
            .with_custom_prompt(config.system_prompt.clone())
            .build_system_prompt();

        info!(
            model = reasoning.model(),
            tools = executor.registry().len(),
            max_tool_iterations = config.max_tool_iterations,
            stream = config.stream,
            "orchestrator ready"
        );

        Self {
            reasoning,
            executor,
            config,
            directive,
        }
    }

    /// Wire the built-in tool catalog and `provider` from a loaded config.
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &Config) -> Self {
        let executor = ToolExecutor::new(
            default_registry(&config.tools),
            ExecutorConfig::from(&config.tools),
        );
        let request = LlmRequestConfig {
            max_tokens: config.agent.max_tokens,
            temperature: config.agent.temperature,
        };
        let reasoning = ReasoningStep::new(
            provider,
            config.agent.model.clone(),
            request,
            executor.definitions(),
        );
        Self::new(reasoning, executor, OrchestratorConfig::from(&config.agent))
    }

    /// The system directive sent with every reasoning call.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn reasoning(&self) -> &ReasoningStep {
        &self.reasoning
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one turn: append `user_text` to `session` and cycle until the
    /// model answers, the cap is hit, the model fails or `cancel` fires.
    pub async fn run(
        &self,
        mut session: SessionState,
        user_text: &str,
        sink: &dyn TurnSink,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, TurnFailure> {
        let unanswered = session.unanswered_tool_calls();
        if !unanswered.is_empty() {
            warn!(ids = ?unanswered, "session has tool calls without results");
        }

        session.push(Message::user(user_text));
        let mut stats = TurnStats::default();

        match self.drive(&mut session, sink, cancel, &mut stats).await {
            Ok((reply, stop)) => {
                info!(
                    stop = ?stop,
                    reasoning_calls = stats.reasoning_calls,
                    tool_calls = stats.tool_calls,
                    reply_len = reply.len(),
                    "turn finished"
                );
                sink.on_event(TurnEvent::Completed { text: reply.clone() });
                Ok(TurnOutcome {
                    session,
                    reply,
                    stop,
                    reasoning_calls: stats.reasoning_calls,
                    tool_calls: stats.tool_calls,
                })
            }
            Err(error) => {
                warn!(
                    error = %error,
                    reasoning_calls = stats.reasoning_calls,
                    tool_calls = stats.tool_calls,
                    "turn failed"
                );
                sink.on_event(TurnEvent::Failed {
                    message: error.to_string(),
                });
                Err(TurnFailure { session, error })
            }
        }
    }

    /// Single turn on a fresh session, without a sink.
    pub async fn ask(&self, text: &str) -> Result<String, TurnFailure> {
        let outcome = self
            .run(SessionState::new(), text, &NullSink, &CancellationToken::new())
            .await?;
        Ok(outcome.reply)
    }

    async fn drive(
        &self,
        session: &mut SessionState,
        sink: &dyn TurnSink,
        cancel: &CancellationToken,
        stats: &mut TurnStats,
    ) -> Result<(String, StopReason), TurnError> {
        let cap = self.config.max_tool_iterations;
        let mut acting_steps = 0u32;
        let mut phase = Phase::Reasoning;

        loop {
            phase = match phase {
                Phase::Reasoning => {
                    if cancel.is_cancelled() {
                        return Err(TurnError::Cancelled);
                    }
                    stats.reasoning_calls += 1;
                    debug!(call = stats.reasoning_calls, history = session.len(), "reasoning");

                    match self.reason(session.messages(), sink, cancel).await? {
                        AssistantTurn::Final(text) => {
                            session.push(Message::assistant(text.clone()));
                            Phase::Done(text, StopReason::Completed)
                        }
                        AssistantTurn::ToolRequest(calls) if acting_steps >= cap => {
                            warn!(
                                cap,
                                discarded = calls.len(),
                                "tool iteration cap reached, ending turn"
                            );
                            session.push(Message::assistant(FALLBACK_REPLY));
                            Phase::Done(FALLBACK_REPLY.to_string(), StopReason::IterationLimit)
                        }
                        AssistantTurn::ToolRequest(calls) => Phase::Acting(calls),
                    }
                }
                Phase::Acting(calls) => {
                    acting_steps += 1;
                    for call in &calls {
                        info!(tool = %call.name, call_id = %call.id, step = acting_steps, "executing tool call");
                        sink.on_event(TurnEvent::ToolInvoked {
                            name: call.name.clone(),
                            query: call.display_query(),
                        });
                    }

                    let results = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TurnError::Cancelled),
                        results = self.executor.execute(&calls) => results,
                    };

                    stats.tool_calls += calls.len();
                    session.push(Message::assistant_tool_calls(calls));
                    session.extend(results.iter().map(ToolResult::to_message));
                    Phase::Reasoning
                }
                Phase::Done(reply, stop) => return Ok((reply, stop)),
            };
        }
    }

    /// One reasoning call, raced against `cancel`. Streamed text is
    /// surfaced to the sink as it arrives, even when it turns out to be a
    /// preamble to a tool request.
    async fn reason(
        &self,
        history: &[Message],
        sink: &dyn TurnSink,
        cancel: &CancellationToken,
    ) -> Result<AssistantTurn, TurnError> {
        if !self.config.stream {
            let turn = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TurnError::Cancelled),
                turn = self.reasoning.invoke(&self.directive, history) => turn?,
            };
            if let AssistantTurn::Final(text) = &turn {
                if !text.is_empty() {
                    sink.on_event(TurnEvent::TextDelta {
                        fragment: text.clone(),
                        text: text.clone(),
                    });
                }
            }
            return Ok(turn);
        }

        let streamed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TurnError::Cancelled),
            turn = self.reasoning.invoke_streaming(&self.directive, history) => turn?,
        };
        match streamed {
            StreamedTurn::ToolRequest(calls) => Ok(AssistantTurn::ToolRequest(calls)),
            StreamedTurn::Text(fragments) => drain(fragments, sink, cancel).await,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
