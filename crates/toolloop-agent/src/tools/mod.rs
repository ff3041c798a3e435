//! Tool layer: trait, catalog, argument validation and the executor.

pub mod base;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod weather;
pub mod web;
pub mod wiki;

use std::sync::Arc;
use std::time::Duration;

use toolloop_core::config::ToolsConfig;

pub use base::{optional_i64, require_string, Tool, ToolArgs};
pub use executor::{ExecutorConfig, ToolExecutor, ToolResult};
pub use registry::ToolRegistry;
pub use weather::WeatherTool;
pub use web::WebSearchTool;
pub use wiki::WikiTool;

/// Registry holding the built-in catalog: `web_search`, `get_wiki` and
/// `fetch_weather`.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(&config.search, timeout)));
    registry.register(Arc::new(WikiTool::new(&config.wiki, timeout)));
    registry.register(Arc::new(WeatherTool::new(&config.weather, timeout)));
    registry
}
