//! Wikipedia lookup through the MediaWiki action API.
//!
//! One request does both the search and the extraction: `generator=search`
//! picks the top pages and `prop=extracts` returns their plain-text intros.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use toolloop_core::config::WikiConfig;
use toolloop_core::error::ToolError;
use toolloop_core::utils::truncate_string;

use super::base::{get_json, http_client, require_string, Tool, ToolArgs};

const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Returns factual summaries of the Wikipedia pages matching a topic.
pub struct WikiTool {
    api_base: String,
    top_k: usize,
    max_chars: usize,
    timeout: Duration,
    client: Client,
}

impl WikiTool {
    pub fn new(config: &WikiConfig, timeout: Duration) -> Self {
        Self {
            api_base: config.api_base.clone(),
            top_k: config.top_k.max(1),
            max_chars: config.max_chars,
            timeout,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl Tool for WikiTool {
    fn name(&self) -> &str {
        "get_wiki"
    }

    fn description(&self) -> &str {
        "Get detailed factual info from Wikipedia. Returns the titles and intro \
         summaries of the best matching pages."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "Subject to look up on Wikipedia",
                    "minLength": 1
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let topic = require_string(args, "topic")?;
        debug!(topic = %topic, top_k = self.top_k, "querying Wikipedia");

        let limit = self.top_k.to_string();
        let request = self.client.get(&self.api_base).query(&[
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("generator", "search"),
            ("gsrsearch", topic.as_str()),
            ("gsrlimit", limit.as_str()),
            ("prop", "extracts"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("redirects", "1"),
        ]);
        let body = get_json(request, "Wikipedia", self.timeout).await?;

        Ok(Value::String(render_pages(&body, self.max_chars)))
    }
}

/// Render pages in search-rank order as `Page:`/`Summary:` blocks.
fn render_pages(body: &Value, max_chars: usize) -> String {
    let mut pages: Vec<&Value> = body["query"]["pages"]
        .as_array()
        .map(|p| p.iter().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p["index"].as_u64().unwrap_or(u64::MAX));

    let blocks: Vec<String> = pages
        .into_iter()
        .filter_map(|page| {
            let title = page["title"].as_str()?;
            let extract = page["extract"].as_str().unwrap_or_default().trim();
            if extract.is_empty() {
                return None;
            }
            Some(format!("Page: {title}\nSummary: {extract}"))
        })
        .collect();

    if blocks.is_empty() {
        return NO_RESULT.to_string();
    }
    truncate_string(&blocks.join("\n\n"), max_chars)
}
