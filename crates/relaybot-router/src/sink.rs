//! Reply sink — where the router hands finished reply chunks.

use async_trait::async_trait;
use thiserror::Error;

use relaybot_core::bus::queue::MessageBus;
use relaybot_core::bus::types::OutboundMessage;

/// An outbound chunk could not be delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("outbound queue is closed")]
    Closed,
    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Delivers one outbound message. Implementations must not retry forever.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_text(&self, reply: OutboundMessage) -> Result<(), SendError>;
}

#[async_trait]
impl ReplySink for MessageBus {
    async fn send_text(&self, reply: OutboundMessage) -> Result<(), SendError> {
        self.publish_outbound(reply)
            .await
            .map_err(|_| SendError::Closed)
    }
}
