//! Core types — conversation turns and the OpenAI chat completions wire format.
//!
//! A [`Turn`] serialises exactly as one element of the `messages` array of a
//! `/chat/completions` request, so a channel's history can be sent as-is.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Speaker of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Configured system prompt. Prepended at call time, never stored.
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of conversational history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Turn {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// LLM Response
// ─────────────────────────────────────────────

/// A successful completion returned by a provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Text content from the assistant. Empty when the API returned `null`.
    pub content: String,
    /// Why the model stopped generating.
    pub finish_reason: Option<String>,
    /// Token usage statistics.
    pub usage: Option<UsageInfo>,
}

/// Token usage statistics from the LLM.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// Provider-related types
// ─────────────────────────────────────────────

/// Raw chat completion response from an OpenAI-compatible API.
/// Used internally for deserialization.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Take the first choice as an [`LlmResponse`]. `None` if there are no choices.
    pub fn into_response(self) -> Option<LlmResponse> {
        let usage = self.usage;
        self.choices.into_iter().next().map(|c| LlmResponse {
            content: c.message.content.unwrap_or_default(),
            finish_reason: c.finish_reason,
            usage,
        })
    }
}

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
