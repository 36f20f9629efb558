//! Configuration schema.
//!
//! Hierarchy: `Config` → `ModelConfig`, `DiscordConfig`, `RouterConfig`, `BusConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a loaded config cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing credential: {0} (set it in config.json or via environment)")]
    MissingCredential(&'static str),
}

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.relaybot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub model: ModelConfig,
    pub discord: DiscordConfig,
    pub router: RouterConfig,
    pub bus: BusConfig,
}

impl Config {
    /// Both collaborator credentials must be present before the gateway starts.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.discord.token.is_empty() {
            return Err(ConfigError::MissingCredential("discord.token"));
        }
        if !self.model.is_configured() {
            return Err(ConfigError::MissingCredential("model.apiKey"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────

/// Language-model completion API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// API key for Bearer authentication.
    pub api_key: String,
    /// Custom API base URL (defaults to OpenAI).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Maximum tokens to generate per response. `None` lets the API decide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Per-request timeout. Expiry counts as a failed completion.
    pub timeout_secs: u64,
    /// Optional system prompt, prepended to every request but never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: None,
            temperature: 0.7,
            timeout_secs: 60,
            system_prompt: None,
        }
    }
}

impl ModelConfig {
    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Discord
// ─────────────────────────────────────────────

/// Discord channel config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordConfig {
    pub token: String,
    /// Discord user IDs allowed to talk to the bot. Empty = everyone.
    pub allowed_users: Vec<String>,
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Message routing behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterConfig {
    /// Hard per-message length ceiling for outbound text.
    pub max_message_length: usize,
    /// Turns kept per channel; oldest evicted first. 0 = unbounded.
    pub history_limit: usize,
    /// Record shortcut replies (coin flip, counts, game start) as assistant turns.
    pub record_shortcut_replies: bool,
    /// Terms blocked in addition to the built-in list.
    pub extra_blocked_terms: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            history_limit: 100,
            record_shortcut_replies: false,
            extra_blocked_terms: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────
// Bus
// ─────────────────────────────────────────────

/// Message bus sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusConfig {
    /// Buffer size of the inbound and outbound queues.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model.model, "gpt-3.5-turbo");
        assert_eq!(config.model.timeout_secs, 60);
        assert_eq!(config.router.max_message_length, 2000);
        assert_eq!(config.router.history_limit, 100);
        assert!(!config.router.record_shortcut_replies);
        assert_eq!(config.bus.capacity, 100);
    }

    #[test]
    fn test_validate_missing_discord_token() {
        let mut config = Config::default();
        config.model.api_key = "sk-test".into();
        assert_eq!(
            config.validate_credentials(),
            Err(ConfigError::MissingCredential("discord.token"))
        );
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = Config::default();
        config.discord.token = "bot-token".into();
        assert_eq!(
            config.validate_credentials(),
            Err(ConfigError::MissingCredential("model.apiKey"))
        );
    }

    #[test]
    fn test_validate_ok() {
        let mut config = Config::default();
        config.discord.token = "bot-token".into();
        config.model.api_key = "sk-test".into();
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["router"].get("maxMessageLength").is_some());
        assert!(json["model"].get("timeoutSecs").is_some());
        assert!(json["model"].get("apiBase").is_none());
    }
}
