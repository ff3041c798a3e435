//! Toolloop CLI — entry point.
//!
//! # Commands
//!
//! - `toolloop ask -m MESSAGE` — one turn, answer streamed to the terminal
//! - `toolloop chat` — interactive REPL keeping the session across turns
//! - `toolloop init` — write the default config file
//! - `toolloop tools` — list the built-in tool catalog

mod helpers;
mod init;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use toolloop_agent::tools::default_registry;
use toolloop_agent::Orchestrator;
use toolloop_core::config::{load_config, Config};
use toolloop_core::session::SessionState;
use toolloop_providers::create_provider;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Tool-using chat assistant: web search, Wikipedia and weather.
#[derive(Parser)]
#[command(name = "toolloop", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.toolloop/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The question
        #[arg(short, long)]
        message: String,

        /// Print the answer only once it is complete
        #[arg(long, default_value_t = false)]
        no_stream: bool,
    },

    /// Interactive chat session
    Chat,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// List the available tools
    Tools,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask { message, no_stream } => {
            let mut config = load_config(config_path);
            if no_stream {
                config.agent.stream = false;
            }
            run_ask(&config, &message).await
        }
        Commands::Chat => {
            let config = load_config(config_path);
            repl::run(build_orchestrator(&config)?).await
        }
        Commands::Init { force } => init::run(config_path, force),
        Commands::Tools => {
            list_tools(&load_config(config_path));
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_ask(config: &Config, message: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let cancel = CancellationToken::new();
    let watcher = helpers::cancel_on_interrupt(cancel.clone());

    info!(model = %config.agent.model, "processing single message");
    let sink = helpers::TerminalSink::new();
    helpers::print_thinking();
    let result = orchestrator
        .run(SessionState::new(), message, &sink, &cancel)
        .await;
    watcher.abort();

    let outcome = result.context("turn failed")?;
    debug!(
        stop = ?outcome.stop,
        reasoning_calls = outcome.reasoning_calls,
        tool_calls = outcome.tool_calls,
        "done"
    );
    Ok(())
}

/// Build the orchestrator from the loaded configuration.
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let provider = create_provider(&config.provider, &config.agent.model)
        .context("failed to create provider (run `toolloop init` and set provider.apiKey)")?;
    Ok(Orchestrator::from_config(Arc::new(provider), config))
}

fn list_tools(config: &Config) {
    let registry = default_registry(&config.tools);
    helpers::print_tools(registry.tool_names().iter().filter_map(|name| {
        registry
            .get(name)
            .map(|tool| (name.as_str(), tool.description().to_string()))
    }));
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("toolloop=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
