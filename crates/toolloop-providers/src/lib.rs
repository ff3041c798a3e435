//! Model provider layer for toolloop.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`]: trait every model backend implements
//! - [`http_provider::HttpProvider`]: OpenAI-compatible HTTP client (atomic + SSE streaming)
//! - [`sse`]: decoding of streamed `chat.completion.chunk` events
//! - [`http_provider::create_provider`]: convenience builder from config

pub mod http_provider;
pub mod sse;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::{create_provider, HttpProvider};
pub use traits::{ChatStream, FragmentStream, LlmProvider, LlmRequestConfig, StreamDelta};
