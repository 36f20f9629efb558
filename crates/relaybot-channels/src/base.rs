//! Channel trait — the interface a chat gateway implements.
//!
//! - `start()` — begin listening and publish `InboundMessage`s to the bus (long-running)
//! - `stop()` — graceful shutdown
//! - `send()` — deliver one outbound message
//! - `name()` — channel identifier, matched against `OutboundMessage.channel`

use async_trait::async_trait;
use relaybot_core::bus::types::OutboundMessage;

/// Every chat gateway implements this trait.
///
/// The `ChannelManager` holds `Arc<dyn Channel>` and orchestrates
/// start/stop/send across all registered channels.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name (e.g. "discord").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    ///
    /// Runs until `stop()` is called or the connection is irrecoverably lost.
    async fn start(&self) -> anyhow::Result<()>;

    /// Graceful shutdown — stop listening and clean up resources.
    async fn stop(&self) -> anyhow::Result<()>;

    /// Send an outbound message to this channel.
    ///
    /// The content is already within the platform's length ceiling. An `Err`
    /// means the platform rejected or dropped the message.
    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;
}
