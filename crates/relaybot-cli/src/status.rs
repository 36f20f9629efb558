//! `relaybot status` — show configuration and credential status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use relaybot_core::config::{get_config_path, load_config, Config};
use relaybot_providers::DEFAULT_API_BASE;

use crate::helpers::check_mark;

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Relaybot Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, run `relaybot init`)".red().to_string()
        }
    );

    for (label, value) in summary_lines(&config) {
        println!("  {:<18} {}", label.bold(), value);
    }

    println!();
    match config.validate_credentials() {
        Ok(()) => println!("  {} ready to run `relaybot gateway`", "✓".green()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }
    println!();

    Ok(())
}

/// Label/value pairs describing the effective config. Secrets are never shown.
fn summary_lines(config: &Config) -> Vec<(&'static str, String)> {
    let model = &config.model;
    let router = &config.router;

    let history = if router.history_limit == 0 {
        "unbounded".to_string()
    } else {
        format!("last {} turns", router.history_limit)
    };

    vec![
        ("Model:", model.model.clone()),
        (
            "API base:",
            model
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        ),
        (
            "Parameters:",
            format!(
                "temp: {} | max_tokens: {} | timeout: {}s",
                model.temperature,
                model
                    .max_tokens
                    .map_or_else(|| "default".to_string(), |t| t.to_string()),
                model.timeout_secs
            ),
        ),
        ("Model API key:", check_mark(model.is_configured())),
        ("Discord token:", check_mark(!config.discord.token.is_empty())),
        (
            "Allowed users:",
            if config.discord.allowed_users.is_empty() {
                "everyone".to_string()
            } else {
                config.discord.allowed_users.len().to_string()
            },
        ),
        ("History:", history),
        ("Max message:", format!("{} chars", router.max_message_length)),
        (
            "Blocklist:",
            format!("built-in + {} extra", router.extra_blocked_terms.len()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(lines: &'a [(&'static str, String)], label: &str) -> &'a str {
        &lines.iter().find(|(l, _)| *l == label).unwrap().1
    }

    #[test]
    fn summary_of_defaults() {
        let lines = summary_lines(&Config::default());
        assert_eq!(value(&lines, "Model:"), "gpt-3.5-turbo");
        assert_eq!(value(&lines, "API base:"), DEFAULT_API_BASE);
        assert_eq!(value(&lines, "History:"), "last 100 turns");
        assert_eq!(value(&lines, "Allowed users:"), "everyone");
        assert!(value(&lines, "Parameters:").contains("max_tokens: default"));
    }

    #[test]
    fn summary_never_prints_secrets() {
        let mut config = Config::default();
        config.model.api_key = "sk-secret".into();
        config.discord.token = "discord-secret".into();
        config.router.history_limit = 0;

        let lines = summary_lines(&config);
        assert!(lines
            .iter()
            .all(|(_, v)| !v.contains("secret")));
        assert_eq!(value(&lines, "History:"), "unbounded");
    }
}
