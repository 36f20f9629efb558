//! `relaybot init` — write a default config file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use relaybot_core::config::{get_config_path, save_config, Config};

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Relaybot — Setup".cyan().bold());
    println!();

    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            path.display()
        );
    }

    println!();
    println!("  Next steps:");
    println!("    1. Set {} and {}", "discord.token".bold(), "model.apiKey".bold());
    println!("       (or export DISCORD_TOKEN / OPENAI_API_KEY)");
    println!("    2. Run {}", "relaybot gateway".bold());
    println!();

    Ok(())
}

/// Write `Config::default()` to `path` unless a file is already there.
///
/// Returns whether a file was written. Credentials from the environment are
/// never persisted.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(true)
}
