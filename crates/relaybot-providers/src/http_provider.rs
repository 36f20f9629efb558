//! HTTP provider for OpenAI-compatible chat completion APIs.
//!
//! Posts the channel history to `<api_base>/chat/completions` with Bearer
//! authentication and returns the first choice.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use relaybot_core::config::ModelConfig;
use relaybot_core::types::{ChatCompletionRequest, ChatCompletionResponse, LlmResponse, Turn};

use crate::error::ProviderError;
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Default API base when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A language-model provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Default model for this provider instance.
    default_model: String,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from the model section of the config.
    ///
    /// The request timeout comes from `timeout_secs`; a timed-out request
    /// surfaces as [`ProviderError::Request`].
    pub fn new(config: &ModelConfig) -> Result<Self, ProviderError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn chat(
        &self,
        messages: &[Turn],
        model: &str,
        config: &LlmRequestConfig,
    ) -> Result<LlmResponse, ProviderError> {
        debug!(model = %model, messages = messages.len(), "Calling LLM");

        let request_body = ChatCompletionRequest {
            model,
            messages,
            max_tokens: config.max_tokens,
            temperature: Some(config.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ProviderError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %body, "API error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_resp = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse LLM response");
            ProviderError::InvalidResponse(e.to_string())
        })?;

        let llm_resp = chat_resp
            .into_response()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?;

        debug!(
            content_len = llm_resp.content.len(),
            finish_reason = llm_resp.finish_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );
        Ok(llm_resp)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn display_name(&self) -> &str {
        "OpenAI-compatible"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
