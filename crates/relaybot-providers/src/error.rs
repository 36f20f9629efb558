//! Provider failures. Every variant is transient from the router's point of view.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, TLS, or timeout failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be understood as a completion.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether the failure was a client-side timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Request(e) if e.is_timeout())
    }
}
