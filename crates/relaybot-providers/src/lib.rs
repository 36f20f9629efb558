//! Language-model provider layer for Relaybot.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait the router calls for completions
//! - [`error::ProviderError`] — transient failures (network, HTTP status, bad body)
//! - [`http_provider::HttpProvider`] — OpenAI-compatible `/chat/completions` client

pub mod error;
pub mod http_provider;
pub mod traits;

pub use error::ProviderError;
pub use http_provider::{HttpProvider, DEFAULT_API_BASE};
pub use traits::{LlmProvider, LlmRequestConfig};
