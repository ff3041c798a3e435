//! `toolloop init` — write the default configuration file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use toolloop_core::config::{get_config_path, save_config, Config};
use toolloop_core::utils::get_history_path;

/// Run the init command.
pub fn run(path: Option<&Path>, force: bool) -> Result<()> {
    println!();
    println!("{}", "toolloop — Setup".cyan().bold());
    println!();

    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    if write_default_config(&config_path, force)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {} (use --force to overwrite)",
            "✓".green(),
            config_path.display()
        );
    }

    if let Some(history_dir) = get_history_path().parent() {
        std::fs::create_dir_all(history_dir)?;
        println!("  {} history dir at {}", "✓".green(), history_dir.display());
    }

    println!();
    println!(
        "{}",
        "  Set provider.apiKey (or TOOLLOOP_PROVIDER__API_KEY), then run `toolloop chat`.".green()
    );
    println!();

    Ok(())
}

/// Write `Config::default()` to `path`. Returns `false` when the file exists
/// and `force` is not set.
fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
