//! Web search via the DuckDuckGo Instant Answer API (no API key needed).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use toolloop_core::config::SearchConfig;
use toolloop_core::error::ToolError;

use super::base::{get_json, http_client, optional_i64, require_string, Tool, ToolArgs};

/// Upper bound for the `maxResults` argument.
const MAX_RESULTS_CAP: usize = 10;

// ─────────────────────────────────────────────
// WebSearchTool
// ─────────────────────────────────────────────

/// Searches the web for recent information.
pub struct WebSearchTool {
    api_base: String,
    max_results: usize,
    timeout: Duration,
    client: Client,
}

impl WebSearchTool {
    pub fn new(config: &SearchConfig, timeout: Duration) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            timeout,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for recent information. Returns a short abstract with its \
         source URL and a numbered list of related results (title - URL)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query",
                    "minLength": 1
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Number of related results (1-10, default 5)",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_CAP
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let query = require_string(args, "query")?;
        let max_results = optional_i64(args, "maxResults")
            .map(|n| n.clamp(1, MAX_RESULTS_CAP as i64) as usize)
            .unwrap_or(self.max_results);

        debug!(query = %query, max_results, "searching web");

        let request = self.client.get(format!("{}/", self.api_base)).query(&[
            ("q", query.as_str()),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let body = get_json(request, "DuckDuckGo", self.timeout).await?;

        Ok(Value::String(render_results(&body, max_results)))
    }
}

/// Flatten `RelatedTopics`, which nests grouped topics under `Topics`.
fn related_topics(body: &Value) -> Vec<(&str, &str)> {
    fn collect<'a>(topics: &'a [Value], out: &mut Vec<(&'a str, &'a str)>) {
        for topic in topics {
            if let Some(nested) = topic["Topics"].as_array() {
                collect(nested, out);
                continue;
            }
            let text = topic["Text"].as_str().unwrap_or_default();
            let url = topic["FirstURL"].as_str().unwrap_or_default();
            if !text.is_empty() {
                out.push((text, url));
            }
        }
    }

    let mut out = Vec::new();
    if let Some(topics) = body["RelatedTopics"].as_array() {
        collect(topics, &mut out);
    }
    out
}

fn render_results(body: &Value, max_results: usize) -> String {
    let mut sections = Vec::new();

    let abstract_text = body["AbstractText"].as_str().unwrap_or_default();
    if !abstract_text.is_empty() {
        let heading = body["Heading"].as_str().unwrap_or_default();
        let mut section = if heading.is_empty() {
            abstract_text.to_string()
        } else {
            format!("{heading}: {abstract_text}")
        };
        if let Some(url) = body["AbstractURL"].as_str().filter(|u| !u.is_empty()) {
            section.push_str(&format!("\nSource: {url}"));
        }
        sections.push(section);
    }

    let lines: Vec<String> = related_topics(body)
        .into_iter()
        .take(max_results)
        .enumerate()
        .map(|(i, (text, url))| format!("{}. {} - {}", i + 1, text, url))
        .collect();
    if !lines.is_empty() {
        sections.push(lines.join("\n"));
    }

    if sections.is_empty() {
        "No results found.".to_string()
    } else {
        sections.join("\n\n")
    }
}
