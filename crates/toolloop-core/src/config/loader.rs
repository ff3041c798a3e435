//! Config loader: reads `~/.toolloop/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.toolloop/config.json`
//! 3. Environment variables `TOOLLOOP_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::schema::Config;

/// Errors raised while writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given path (or the default one) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(config)?;

    std::fs::write(&config_path, json).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    debug!("Config saved to {}", config_path.display());
    Ok(config_path)
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `TOOLLOOP_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `TOOLLOOP_AGENT__MODEL` → `agent.model`
/// - `TOOLLOOP_AGENT__MAX_TOKENS` → `agent.max_tokens`
/// - `TOOLLOOP_AGENT__TEMPERATURE` → `agent.temperature`
/// - `TOOLLOOP_AGENT__MAX_TOOL_ITERATIONS` → `agent.max_tool_iterations`
/// - `TOOLLOOP_AGENT__STREAM` → `agent.stream`
/// - `TOOLLOOP_PROVIDER__API_KEY` → `provider.api_key`
/// - `TOOLLOOP_PROVIDER__API_BASE` → `provider.api_base`
/// - `TOOLLOOP_TOOLS__TIMEOUT_SECS` → `tools.timeout_secs`
/// - `TOOLLOOP_TOOLS__MAX_CONCURRENCY` → `tools.max_concurrency`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("TOOLLOOP_AGENT__MODEL") {
        config.agent.model = val;
    }
    override_parsed("TOOLLOOP_AGENT__MAX_TOKENS", &mut config.agent.max_tokens);
    override_parsed("TOOLLOOP_AGENT__TEMPERATURE", &mut config.agent.temperature);
    override_parsed(
        "TOOLLOOP_AGENT__MAX_TOOL_ITERATIONS",
        &mut config.agent.max_tool_iterations,
    );
    if let Ok(val) = std::env::var("TOOLLOOP_AGENT__STREAM") {
        config.agent.stream = val == "true" || val == "1";
    }

    if let Ok(val) = std::env::var("TOOLLOOP_PROVIDER__API_KEY") {
        config.provider.api_key = val;
    }
    if let Ok(val) = std::env::var("TOOLLOOP_PROVIDER__API_BASE") {
        config.provider.api_base = val;
    }

    override_parsed("TOOLLOOP_TOOLS__TIMEOUT_SECS", &mut config.tools.timeout_secs);
    override_parsed(
        "TOOLLOOP_TOOLS__MAX_CONCURRENCY",
        &mut config.tools.max_concurrency,
    );

    config
}

/// Overwrite `target` with the parsed env var; unparsable values are ignored.
fn override_parsed<T: FromStr>(var: &str, target: &mut T) {
    if let Ok(val) = std::env::var(var) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var = var, value = %val, "ignoring unparsable env override"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
