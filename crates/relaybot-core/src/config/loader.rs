//! Config loader — reads `~/.relaybot/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.relaybot/config.json`
//! 3. Environment variables `RELAYBOT_<SECTION>__<FIELD>` (override JSON)
//! 4. `DISCORD_TOKEN` / `OPENAI_API_KEY`, only where the credential is still empty

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
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
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `RELAYBOT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `RELAYBOT_MODEL__MODEL`, `__API_KEY`, `__API_BASE`, `__MAX_TOKENS`,
///   `__TEMPERATURE`, `__TIMEOUT_SECS`, `__SYSTEM_PROMPT`
/// - `RELAYBOT_DISCORD__TOKEN`, `RELAYBOT_DISCORD__ALLOWED_USERS` (comma-separated)
/// - `RELAYBOT_ROUTER__MAX_MESSAGE_LENGTH`, `__HISTORY_LIMIT`, `__RECORD_SHORTCUT_REPLIES`
/// - `RELAYBOT_BUS__CAPACITY`
fn apply_env_overrides(mut config: Config) -> Config {
    // Model
    if let Ok(val) = std::env::var("RELAYBOT_MODEL__MODEL") {
        config.model.model = val;
    }
    if let Ok(val) = std::env::var("RELAYBOT_MODEL__API_KEY") {
        config.model.api_key = val;
    }
    if let Ok(val) = std::env::var("RELAYBOT_MODEL__API_BASE") {
        config.model.api_base = Some(val);
    }
    if let Some(n) = parse_env::<u32>("RELAYBOT_MODEL__MAX_TOKENS") {
        config.model.max_tokens = Some(n);
    }
    if let Some(t) = parse_env::<f64>("RELAYBOT_MODEL__TEMPERATURE") {
        config.model.temperature = t;
    }
    if let Some(s) = parse_env::<u64>("RELAYBOT_MODEL__TIMEOUT_SECS") {
        config.model.timeout_secs = s;
    }
    if let Ok(val) = std::env::var("RELAYBOT_MODEL__SYSTEM_PROMPT") {
        config.model.system_prompt = Some(val);
    }

    // Discord
    if let Ok(val) = std::env::var("RELAYBOT_DISCORD__TOKEN") {
        config.discord.token = val;
    }
    if let Ok(val) = std::env::var("RELAYBOT_DISCORD__ALLOWED_USERS") {
        config.discord.allowed_users = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    // Router
    if let Some(n) = parse_env::<usize>("RELAYBOT_ROUTER__MAX_MESSAGE_LENGTH") {
        config.router.max_message_length = n;
    }
    if let Some(n) = parse_env::<usize>("RELAYBOT_ROUTER__HISTORY_LIMIT") {
        config.router.history_limit = n;
    }
    if let Ok(val) = std::env::var("RELAYBOT_ROUTER__RECORD_SHORTCUT_REPLIES") {
        config.router.record_shortcut_replies = val == "true" || val == "1";
    }

    // Bus
    if let Some(n) = parse_env::<usize>("RELAYBOT_BUS__CAPACITY") {
        config.bus.capacity = n;
    }

    // Conventional credential variables fill in whatever is still missing
    if config.discord.token.is_empty() {
        if let Ok(val) = std::env::var("DISCORD_TOKEN") {
            config.discord.token = val;
        }
    }
    if config.model.api_key.is_empty() {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            config.model.api_key = val;
        }
    }

    config
}

/// Read and parse an env var, ignoring it (with a warning) if malformed.
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring malformed env override");
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
