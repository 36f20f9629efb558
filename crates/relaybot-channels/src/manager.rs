//! Channel Manager — orchestrates channel lifecycle and outbound delivery.
//!
//! Responsibilities:
//! - Register gateway channels
//! - Start/stop all channels concurrently via `tokio::spawn`
//! - Deliver outbound messages from the bus to the correct channel,
//!   logging (never retrying) any send failure

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use relaybot_core::bus::queue::MessageBus;

use crate::base::Channel;

// ─────────────────────────────────────────────
// ChannelManager
// ─────────────────────────────────────────────

/// Manages the lifecycle and outbound delivery for all chat channels.
pub struct ChannelManager {
    /// Registered channels, keyed by name.
    channels: HashMap<String, Arc<dyn Channel>>,
    /// Message bus for outbound message consumption.
    bus: Arc<MessageBus>,
    /// Shutdown signal.
    shutdown: Arc<Notify>,
}

impl ChannelManager {
    /// Create a new channel manager.
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            channels: HashMap::new(),
            bus,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Register a channel. Overwrites any previous channel with the same name.
    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        let name = channel.name().to_string();
        info!(channel = %name, "registered channel");
        self.channels.insert(name, channel);
    }

    /// Get a registered channel by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Channel>> {
        self.channels.get(name)
    }

    /// Get the names of all registered channels, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether there are no registered channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Start all channels + the outbound dispatcher.
    ///
    /// Blocks until `stop_all()` signals shutdown.
    pub async fn start_all(&self) -> Result<()> {
        if self.channels.is_empty() {
            warn!("no channels registered, nothing to start");
            return Ok(());
        }

        info!(
            channels = ?self.channel_names(),
            "starting {} channel(s)",
            self.channels.len()
        );

        let mut handles = Vec::new();

        for (name, channel) in &self.channels {
            let ch = channel.clone();
            let ch_name = name.clone();

            handles.push(tokio::spawn(async move {
                info!(channel = %ch_name, "channel starting");
                if let Err(e) = ch.start().await {
                    error!(channel = %ch_name, error = %e, "channel start failed");
                }
                info!(channel = %ch_name, "channel stopped");
            }));
        }

        let bus = self.bus.clone();
        let channels = self.channels.clone();
        let shutdown = self.shutdown.clone();

        handles.push(tokio::spawn(async move {
            Self::dispatch_outbound(bus, channels, shutdown).await;
        }));

        self.shutdown.notified().await;

        info!("channel manager shutting down");
        for handle in handles {
            handle.abort();
        }
        Ok(())
    }

    /// Stop all channels and the outbound dispatcher.
    pub async fn stop_all(&self) {
        info!("stopping all channels");

        self.shutdown.notify_waiters();

        for (name, channel) in &self.channels {
            debug!(channel = %name, "stopping channel");
            if let Err(e) = channel.stop().await {
                error!(channel = %name, error = %e, "channel stop failed");
            }
        }

        info!("all channels stopped");
    }

    /// Outbound dispatcher — delivers router replies to the correct channel.
    async fn dispatch_outbound(
        bus: Arc<MessageBus>,
        channels: HashMap<String, Arc<dyn Channel>>,
        shutdown: Arc<Notify>,
    ) {
        info!("outbound dispatcher started");

        loop {
            tokio::select! {
                msg = bus.consume_outbound() => {
                    let Some(outbound) = msg else {
                        info!("outbound bus closed, dispatcher exiting");
                        break;
                    };

                    debug!(
                        channel = %outbound.channel,
                        chat_id = %outbound.chat_id,
                        content_len = outbound.content.len(),
                        "dispatching outbound message"
                    );

                    match channels.get(&outbound.channel) {
                        Some(channel) => {
                            if let Err(e) = channel.send(&outbound).await {
                                error!(
                                    channel = %outbound.channel,
                                    chat_id = %outbound.chat_id,
                                    error = %e,
                                    "failed to send outbound message, dropping it"
                                );
                            }
                        }
                        None => warn!(
                            channel = %outbound.channel,
                            "no channel registered for outbound message"
                        ),
                    }
                }
                _ = shutdown.notified() => {
                    info!("dispatcher received shutdown signal");
                    break;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_core::bus::types::OutboundMessage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockChannel {
        channel_name: String,
        stopped: Arc<AtomicBool>,
        send_count: Arc<AtomicUsize>,
        fail_sends: bool,
    }

    impl MockChannel {
        fn new(name: &str) -> Self {
            Self {
                channel_name: name.into(),
                stopped: Arc::new(AtomicBool::new(false)),
                send_count: Arc::new(AtomicUsize::new(0)),
                fail_sends: false,
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                fail_sends: true,
                ..Self::new(name)
            }
        }
    }

    #[async_trait::async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            &self.channel_name
        }

        async fn start(&self) -> anyhow::Result<()> {
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn send(&self, _msg: &OutboundMessage) -> anyhow::Result<()> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_sends {
                anyhow::bail!("rejected by platform");
            }
            Ok(())
        }
    }

    #[test]
    fn test_new_manager_empty() {
        let mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        assert!(mgr.is_empty());
        assert_eq!(mgr.len(), 0);
    }

    #[test]
    fn test_register_channel() {
        let mut mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        mgr.register(Arc::new(MockChannel::new("discord")));

        assert_eq!(mgr.len(), 1);
        assert!(mgr.get("discord").is_some());
        assert!(mgr.get("cli").is_none());
    }

    #[test]
    fn test_register_overwrites() {
        let mut mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        mgr.register(Arc::new(MockChannel::new("discord")));
        mgr.register(Arc::new(MockChannel::new("discord")));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_channel_names_sorted() {
        let mut mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        mgr.register(Arc::new(MockChannel::new("discord")));
        mgr.register(Arc::new(MockChannel::new("cli")));
        assert_eq!(mgr.channel_names(), vec!["cli", "discord"]);
    }

    #[tokio::test]
    async fn test_start_all_empty() {
        let mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        assert!(mgr.start_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_all() {
        let mut mgr = ChannelManager::new(Arc::new(MessageBus::new(32)));
        let ch = Arc::new(MockChannel::new("discord"));
        let stopped = ch.stopped.clone();
        mgr.register(ch);

        mgr.stop_all().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dispatch_outbound_routes_correctly() {
        let bus = Arc::new(MessageBus::new(32));

        let discord = Arc::new(MockChannel::new("discord"));
        let cli = Arc::new(MockChannel::new("cli"));
        let discord_count = discord.send_count.clone();
        let cli_count = cli.send_count.clone();

        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("discord".into(), discord);
        channels.insert("cli".into(), cli);

        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(ChannelManager::dispatch_outbound(
            bus.clone(),
            channels,
            shutdown.clone(),
        ));

        bus.publish_outbound(OutboundMessage::new("discord", "c1", "one"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("cli", "local", "two"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("discord", "c2", "three"))
            .await
            .unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        shutdown.notify_waiters();
        let _ = handle.await;

        assert_eq!(discord_count.load(Ordering::SeqCst), 2);
        assert_eq!(cli_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_survives_send_failure() {
        let bus = Arc::new(MessageBus::new(32));

        let failing = Arc::new(MockChannel::failing("discord"));
        let attempts = failing.send_count.clone();

        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("discord".into(), failing);

        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(ChannelManager::dispatch_outbound(
            bus.clone(),
            channels,
            shutdown.clone(),
        ));

        for i in 0..3 {
            bus.publish_outbound(OutboundMessage::new("discord", "c1", format!("m{i}")))
                .await
                .unwrap();
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        shutdown.notify_waiters();
        let _ = handle.await;

        // Every message was attempted exactly once; none retried, none blocked the rest
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dispatch_outbound_unknown_channel() {
        let bus = Arc::new(MessageBus::new(32));
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(ChannelManager::dispatch_outbound(
            bus.clone(),
            HashMap::new(),
            shutdown.clone(),
        ));

        bus.publish_outbound(OutboundMessage::new("unknown", "chat", "msg"))
            .await
            .unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        shutdown.notify_waiters();
        let _ = handle.await;
    }
}
