//! LLM Provider trait — the seam between the router and the completion API.

use async_trait::async_trait;
use relaybot_core::types::{LlmResponse, Turn};

use crate::error::ProviderError;

/// Configuration passed to each LLM call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Maximum tokens to generate. `None` lets the API decide.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: 0.7,
        }
    }
}

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` — Full ordered history in OpenAI format.
    /// * `model`    — Model identifier (e.g. `"gpt-3.5-turbo"`).
    /// * `config`   — Temperature, max_tokens.
    ///
    /// No streaming: the call resolves once the whole reply is available.
    async fn chat(
        &self,
        messages: &[Turn],
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError>;

    /// The default model for this provider instance.
    fn default_model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
