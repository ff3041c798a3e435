//! Scripted doubles shared by the engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use toolloop_core::error::{ModelError, ToolError};
use toolloop_core::types::{LlmResponse, Message, ToolCall, ToolDefinition};
use toolloop_providers::{ChatStream, LlmProvider, LlmRequestConfig, StreamDelta};

use crate::sink::{TurnEvent, TurnSink};
use crate::tools::{Tool, ToolArgs};

/// One scripted model reply.
pub enum Step {
    Reply(LlmResponse),
    Fragments(Vec<Result<String, ModelError>>),
    /// Streams this text, then requests these tools.
    Preamble(String, Vec<ToolCall>),
    /// Emits these fragments, then never finishes.
    Stall(Vec<String>),
    Fail(ModelError),
    /// Never answers.
    Hang,
}

pub fn text(content: &str) -> Step {
    Step::Reply(LlmResponse::text(content))
}

pub fn calls(calls: Vec<ToolCall>) -> Step {
    Step::Reply(LlmResponse::tool_calls(calls))
}

pub fn call(id: &str, name: &str, args: Value) -> ToolCall {
    ToolCall::new(id, name, args)
}

/// Provider replaying a fixed script and recording every request.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    pub requests: Mutex<Vec<Vec<Message>>>,
    pub tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[index].clone()
    }

    fn next(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> Step {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tool_counts
            .lock()
            .unwrap()
            .push(tools.map_or(0, |t| t.len()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Fail(ModelError::Request("script exhausted".into())))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _model: &str,
        _config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ModelError> {
        match self.next(messages, tools) {
            Step::Reply(response) => Ok(response),
            Step::Fragments(fragments) => {
                let text: Result<String, ModelError> = fragments.into_iter().collect();
                text.map(LlmResponse::text)
            }
            Step::Preamble(text, calls) => Ok(LlmResponse {
                content: Some(text),
                ..LlmResponse::tool_calls(calls)
            }),
            Step::Fail(e) => Err(e),
            Step::Stall(_) | Step::Hang => std::future::pending().await,
        }
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        _model: &str,
        _config: &LlmRequestConfig,
    ) -> Result<ChatStream, ModelError> {
        match self.next(messages, tools) {
            Step::Reply(response) => Ok(ChatStream::from(response)),
            Step::Fragments(fragments) => {
                let items: Vec<_> = fragments
                    .into_iter()
                    .map(|f| f.map(StreamDelta::Text))
                    .collect();
                Ok(ChatStream::Text(Box::pin(stream::iter(items))))
            }
            Step::Preamble(text, calls) => {
                let items = vec![
                    Ok::<_, ModelError>(StreamDelta::Text(text)),
                    Ok(StreamDelta::ToolCalls(calls)),
                ];
                Ok(ChatStream::Text(Box::pin(stream::iter(items))))
            }
            Step::Stall(fragments) => {
                let head = stream::iter(
                    fragments
                        .into_iter()
                        .map(|f| Ok::<_, ModelError>(StreamDelta::Text(f))),
                );
                Ok(ChatStream::Text(Box::pin(head.chain(stream::pending()))))
            }
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }
}

/// Sink recording every notice.
#[derive(Default)]
pub struct RecordingSink(pub Mutex<Vec<TurnEvent>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<TurnEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl TurnSink for RecordingSink {
    fn on_event(&self, event: TurnEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// `fetch_weather` stand-in: Paris has data, every other place is
/// unavailable.
pub struct FakeWeather {
    pub invocations: AtomicUsize,
}

impl FakeWeather {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FakeWeather {
    fn name(&self) -> &str {
        "fetch_weather"
    }
    fn description(&self) -> &str {
        "Current weather"
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        })
    }
    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match args.get("location").and_then(Value::as_str) {
            Some("Paris") => Ok(json!({
                "city": "Paris",
                "country": "France",
                "current_weather": {
                    "temperature": 18.4,
                    "weathercode": 2,
                    "weather_description": "partly cloudy ⛅"
                }
            })),
            Some(other) => Ok(json!({
                "status": "unavailable",
                "message": format!("Weather data for '{other}' is currently unavailable.")
            })),
            None => Err(ToolError::InvalidArguments("location".into())),
        }
    }
}

/// Tool that never finishes.
pub struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }
    fn description(&self) -> &str {
        "Never finishes"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _args: &ToolArgs) -> Result<Value, ToolError> {
        std::future::pending().await
    }
}
