//! Shared CLI helpers — path expansion, router wiring, terminal output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use relaybot_core::config::Config;
use relaybot_providers::HttpProvider;
use relaybot_router::{MessageRouter, ReplySink};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Build a router backed by the configured HTTP model provider.
pub fn build_router(config: &Config, sink: Arc<dyn ReplySink>) -> Result<MessageRouter> {
    let provider = HttpProvider::new(&config.model).context("failed to create model provider")?;
    Ok(MessageRouter::new(
        Arc::new(provider),
        sink,
        &config.model,
        &config.router,
    ))
}

/// Print the banner shown at startup.
pub fn print_banner(mode: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}  {}",
        "Relaybot".cyan().bold(),
        version.dimmed(),
        mode.dimmed()
    );
    println!();
}

/// Print the bot's reply messages, one block per sent message.
pub fn print_replies(replies: &[String]) {
    println!();
    if replies.is_empty() {
        println!("{}", "(no reply)".dimmed());
    }
    for reply in replies {
        println!("{} {}", "Relaybot:".cyan().bold(), reply);
    }
    println!();
}

/// ✓ / ✗ marker for a yes/no status line.
pub fn check_mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
