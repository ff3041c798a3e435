//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history. The
//! session lives in memory for the lifetime of the REPL.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use toolloop_agent::Orchestrator;
use toolloop_core::session::SessionState;
use toolloop_core::utils::get_history_path;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(orchestrator: Orchestrator) -> Result<()> {
    helpers::print_banner(orchestrator.reasoning().model());

    let mut editor = create_editor()?;
    let mut session = SessionState::new();

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(history = session.len(), input = trimmed, "processing input");
        let cancel = CancellationToken::new();
        let watcher = helpers::cancel_on_interrupt(cancel.clone());
        let sink = helpers::TerminalSink::new();
        helpers::print_thinking();

        let result = orchestrator.run(session, trimmed, &sink, &cancel).await;
        watcher.abort();

        session = match result {
            Ok(outcome) => outcome.session,
            Err(failure) => {
                helpers::clear_thinking();
                helpers::print_turn_error(&failure.error);
                failure.session
            }
        };
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
