//! Shared CLI helpers — terminal sink, banner, error and catalog printing.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use toolloop_agent::{TurnError, TurnEvent, TurnSink};

/// Renders turn events on the terminal: tool notices on stderr, the answer
/// on stdout as it streams in.
#[derive(Default)]
pub struct TerminalSink {
    /// A notice or fragment has already replaced the thinking placeholder.
    started: AtomicBool,
    /// At least one answer fragment was printed.
    streamed: AtomicBool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            clear_thinking();
        }
    }
}

impl TurnSink for TerminalSink {
    fn on_event(&self, event: TurnEvent) {
        self.begin();
        match event {
            TurnEvent::ToolInvoked { name, query } => {
                // A streamed preamble leaves the cursor mid-line.
                if self.streamed.swap(false, Ordering::SeqCst) {
                    println!();
                }
                eprintln!("{}", format!("  ↳ {name}: {query}").dimmed());
            }
            TurnEvent::TextDelta { fragment, .. } => {
                if !self.streamed.swap(true, Ordering::SeqCst) {
                    print_header();
                }
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            }
            TurnEvent::Completed { text } => {
                if !self.streamed.load(Ordering::SeqCst) {
                    print_header();
                    if text.is_empty() {
                        print!("{}", "(no response)".dimmed());
                    } else {
                        print!("{text}");
                    }
                }
                println!();
                println!();
            }
            TurnEvent::Failed { .. } => {
                if self.streamed.load(Ordering::SeqCst) {
                    println!();
                }
            }
        }
    }
}

/// Cancel `token` when Ctrl-C arrives. Abort the handle once the turn ends.
pub fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

fn print_header() {
    println!();
    println!("{}", "toolloop".cyan().bold());
}

/// Print the banner shown at REPL start.
pub fn print_banner(model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}  {}",
        "toolloop".cyan().bold(),
        version.dimmed(),
        model.dimmed()
    );
    println!(
        "{}",
        "Type a message, or \"exit\" to quit. Ctrl-C cancels a running turn.".dimmed()
    );
    println!();
}

/// One line describing a failed turn.
pub fn print_turn_error(error: &TurnError) {
    match error {
        TurnError::Cancelled => eprintln!("{}", "(cancelled)".yellow()),
        TurnError::Model(e) => eprintln!("{} {e}", "Error:".red().bold()),
    }
}

/// Print `(name, description)` pairs as an aligned list.
pub fn print_tools<'a>(tools: impl Iterator<Item = (&'a str, String)>) {
    println!();
    println!("{}", "Tools:".bold());
    for (name, description) in tools {
        println!("  {:<16} {}", name.green(), first_line(&description));
    }
    println!();
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Print a "thinking" placeholder until the first event arrives.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
