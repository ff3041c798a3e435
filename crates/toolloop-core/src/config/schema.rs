//! Configuration schema.
//!
//! Hierarchy: `Config` → `AgentConfig`, `ProviderConfig`, `ToolsConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! Every struct is `#[serde(default)]` so partial files are valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration, loaded from `~/.toolloop/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentConfig,
    pub provider: ProviderConfig,
    pub tools: ToolsConfig,
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Orchestration settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// Model identifier sent to the provider.
    pub model: String,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum reasoning ⇄ acting cycles per turn before the fallback reply.
    pub max_tool_iterations: u32,
    /// Replaces the built-in system directive when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Stream the final answer fragment by fragment.
    pub stream: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            max_tool_iterations: 4,
            system_prompt: None,
            stream: true,
        }
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Connection settings for the OpenAI-compatible model endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for Bearer authentication.
    pub api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
    /// Whole-request timeout, streaming included.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            extra_headers: None,
            timeout_secs: 120,
        }
    }
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────

/// Tool execution settings and the endpoints of the built-in catalog.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolsConfig {
    /// Per-call timeout applied by the executor.
    pub timeout_secs: u64,
    /// Tool calls of one step that may run at the same time.
    pub max_concurrency: usize,
    pub search: SearchConfig,
    pub wiki: WikiConfig,
    pub weather: WeatherConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrency: 4,
            search: SearchConfig::default(),
            wiki: WikiConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// Web search (DuckDuckGo Instant Answer API).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub api_base: String,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.duckduckgo.com".to_string(),
            max_results: 5,
        }
    }
}

/// Wikipedia lookup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WikiConfig {
    /// MediaWiki action API endpoint.
    pub api_base: String,
    /// Pages summarised per lookup.
    pub top_k: usize,
    /// Cap on the returned text.
    pub max_chars: usize,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://en.wikipedia.org/w/api.php".to_string(),
            top_k: 3,
            max_chars: 4000,
        }
    }
}

/// Weather lookup (Open-Meteo).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherConfig {
    pub geocoding_base: String,
    pub forecast_base: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_base: "https://geocoding-api.open-meteo.com".to_string(),
            forecast_base: "https://api.open-meteo.com".to_string(),
        }
    }
}
