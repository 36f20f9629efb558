//! Async message bus between the gateway channels and the router.
//!
//! Uses tokio::sync::mpsc bounded channels.

use super::types::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// The message bus connecting channels ↔ router.
///
/// - Channels publish to `inbound` (user messages arriving)
/// - Router consumes from `inbound`, decides, publishes to `outbound`
/// - Channel manager consumes from `outbound` and routes to correct channel
pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: tokio::sync::Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    /// Create a new message bus with the given buffer capacity.
    pub fn new(buffer_size: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer_size.max(1));

        MessageBus {
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: tokio::sync::Mutex::new(outbound_rx),
        }
    }

    /// Publish a message from a channel to the router (inbound).
    pub async fn publish_inbound(
        &self,
        msg: InboundMessage,
    ) -> Result<(), mpsc::error::SendError<InboundMessage>> {
        self.inbound_tx.send(msg).await
    }

    /// Consume the next inbound message (blocks until available).
    /// Returns None if all senders are dropped.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await
    }

    /// Publish a reply from the router to a channel (outbound).
    pub async fn publish_outbound(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        self.outbound_tx.send(msg).await
    }

    /// Consume the next outbound message (blocks until available).
    /// Returns None if all senders are dropped.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv().await
    }
}
