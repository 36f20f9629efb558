//! Discord channel — raw Gateway WebSocket + REST API.
//!
//! Uses the raw Discord Gateway (WebSocket) for receiving messages
//! and the REST API for sending. No heavy Discord library required.
//!
//! Features:
//! - Gateway v10 WebSocket with heartbeat, zombie detection, and resume
//! - Mention / direct-message / bot-author flags for the router
//! - Typing indicator while a reply is pending
//! - Allow-list by Discord user ID
//! - Rate-limit retry (HTTP 429)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

use relaybot_core::bus::queue::MessageBus;
use relaybot_core::bus::types::{InboundMessage, OutboundMessage};

use crate::base::Channel;

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

/// Discord REST API base URL.
const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Default Gateway WebSocket URL.
const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Discord message length limit, in characters.
pub const DISCORD_MAX_LEN: usize = 2000;

/// Typing indicator refresh interval (Discord typing lasts ~10s).
const TYPING_INTERVAL_SECS: u64 = 8;

/// Give up on the typing indicator if no reply arrives within ~2 minutes.
const MAX_TYPING_REFRESHES: u32 = 15;

/// Delay before reconnecting a dropped gateway session.
const RECONNECT_DELAY_SECS: u64 = 5;

/// Attempts for a non-429 REST failure before reporting it.
const MAX_SEND_ATTEMPTS: u32 = 3;

/// Default intents: GUILDS(1) + GUILD_MESSAGES(512) + DMs(4096) + MESSAGE_CONTENT(32768).
const DEFAULT_INTENTS: u64 = 1 + 512 + 4096 + 32768;

// Gateway opcodes
const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_RESUME: u64 = 6;
const OP_RECONNECT: u64 = 7;
const OP_INVALID_SESSION: u64 = 9;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

// ─────────────────────────────────────────────
// DiscordChannel
// ─────────────────────────────────────────────

/// Discord channel using raw Gateway WebSocket + REST API.
pub struct DiscordChannel {
    /// Bot token from Discord Developer Portal.
    token: String,
    /// Message bus for inbound publishing.
    bus: Arc<MessageBus>,
    /// Allow-list of Discord user IDs. Empty = allow everyone.
    allowed_users: Vec<String>,
    /// Gateway WebSocket URL.
    gateway_url: String,
    /// Gateway intents bitmask.
    intents: u64,
    /// Shutdown signal.
    shutdown: Arc<Notify>,
    /// HTTP client for REST API calls.
    http: reqwest::Client,
    /// Active typing indicator tasks keyed by channel_id.
    typing_tasks: Arc<RwLock<HashMap<String, tokio::task::JoinHandle<()>>>>,
    /// Gateway sequence number for heartbeats.
    seq: Arc<Mutex<Option<u64>>>,
    /// Whether last heartbeat was ACKed (zombie detection).
    heartbeat_acked: Arc<Mutex<bool>>,
    /// Session ID for resume.
    session_id: Arc<Mutex<Option<String>>>,
    /// Resume gateway URL.
    resume_url: Arc<Mutex<Option<String>>>,
    /// Our own user ID, learned from READY. Needed to detect mentions.
    bot_user_id: Arc<RwLock<Option<String>>>,
}

impl DiscordChannel {
    /// Create a new Discord channel.
    pub fn new(token: String, bus: Arc<MessageBus>, allowed_users: Vec<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to configure discord HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            token,
            bus,
            allowed_users,
            gateway_url: DEFAULT_GATEWAY_URL.into(),
            intents: DEFAULT_INTENTS,
            shutdown: Arc::new(Notify::new()),
            http,
            typing_tasks: Arc::new(RwLock::new(HashMap::new())),
            seq: Arc::new(Mutex::new(None)),
            heartbeat_acked: Arc::new(Mutex::new(true)),
            session_id: Arc::new(Mutex::new(None)),
            resume_url: Arc::new(Mutex::new(None)),
            bot_user_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Check if a sender is allowed.
    fn is_allowed(&self, sender_id: &str) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.iter().any(|u| u == sender_id)
    }

    /// Run the Gateway WebSocket connection with auto-reconnect.
    async fn run_gateway(&self) -> anyhow::Result<()> {
        loop {
            match self.gateway_session().await {
                Ok(()) => {
                    info!("discord gateway session ended normally");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "discord gateway error, reconnecting in {RECONNECT_DELAY_SECS}s");
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)) => {}
                        _ = self.shutdown.notified() => {
                            info!("discord shutdown during reconnect wait");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Single Gateway WebSocket session.
    ///
    /// `Ok` means a deliberate shutdown or a clean close; `Err` asks the
    /// caller to reconnect.
    async fn gateway_session(&self) -> anyhow::Result<()> {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        let url = self
            .resume_url
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| self.gateway_url.clone());

        debug!(url = %url, "connecting to discord gateway");
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        // Every outgoing frame (identify, resume, heartbeats) goes through one writer task
        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(16);
        let writer = tokio::spawn(async move {
            while let Some(frame) = ws_rx.recv().await {
                if let Err(e) = write.send(WsMessage::text(frame)).await {
                    warn!(error = %e, "discord ws write error");
                    break;
                }
            }
            let _ = write.send(WsMessage::Close(None)).await;
        });

        let zombie = Arc::new(Notify::new());
        let mut heartbeat: Option<tokio::task::JoinHandle<()>> = None;

        let result = loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(WsMessage::Text(t))) => t.to_string(),
                        Some(Ok(WsMessage::Close(_))) | None => {
                            info!("discord ws closed");
                            break Ok(());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            error!(error = %e, "discord ws read error");
                            break Err(e.into());
                        }
                    };

                    let payload: Value = match serde_json::from_str(&text) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!(error = %e, "discord ws invalid json");
                            continue;
                        }
                    };

                    if let Some(s) = payload["s"].as_u64() {
                        *self.seq.lock().await = Some(s);
                    }

                    match payload["op"].as_u64() {
                        Some(OP_HELLO) => {
                            let interval = payload["d"]["heartbeat_interval"]
                                .as_u64()
                                .unwrap_or(41250);
                            debug!(interval_ms = interval, "discord HELLO received");

                            if let Some(h) = heartbeat.take() {
                                h.abort();
                            }
                            *self.heartbeat_acked.lock().await = true;
                            heartbeat = Some(self.spawn_heartbeat(interval, ws_tx.clone(), zombie.clone()));

                            let hello_reply = self.identify_or_resume().await;
                            if ws_tx.send(hello_reply).await.is_err() {
                                break Err(anyhow::anyhow!("discord ws writer closed"));
                            }
                        }
                        Some(OP_DISPATCH) => {
                            let event = payload["t"].as_str().unwrap_or("");
                            self.handle_dispatch(event, &payload["d"]).await;
                        }
                        Some(OP_HEARTBEAT_ACK) => {
                            *self.heartbeat_acked.lock().await = true;
                        }
                        Some(OP_HEARTBEAT) => {
                            // Server requesting immediate heartbeat
                            let s = *self.seq.lock().await;
                            let _ = ws_tx.send(json!({"op": OP_HEARTBEAT, "d": s}).to_string()).await;
                        }
                        Some(OP_RECONNECT) => {
                            info!("discord server requested reconnect");
                            break Err(anyhow::anyhow!("reconnect requested"));
                        }
                        Some(OP_INVALID_SESSION) => {
                            let resumable = payload["d"].as_bool().unwrap_or(false);
                            warn!(resumable = resumable, "discord invalid session");
                            if !resumable {
                                *self.session_id.lock().await = None;
                                *self.resume_url.lock().await = None;
                            }
                            break Err(anyhow::anyhow!("invalid session"));
                        }
                        _ => {}
                    }
                }
                _ = zombie.notified() => {
                    warn!("discord heartbeat not ACKed, reconnecting");
                    break Err(anyhow::anyhow!("zombied connection"));
                }
                _ = self.shutdown.notified() => {
                    info!("discord shutdown signal received");
                    break Ok(());
                }
            }
        };

        if let Some(h) = heartbeat {
            h.abort();
        }
        drop(ws_tx);
        // Writer exits once every sender is gone; don't hang on a dead socket.
        let _ = tokio::time::timeout(Duration::from_secs(2), writer).await;

        result
    }

    /// Build the IDENTIFY payload, or RESUME when a previous session exists.
    async fn identify_or_resume(&self) -> String {
        let session = self.session_id.lock().await.clone();
        match session {
            Some(sid) => {
                let s = *self.seq.lock().await;
                json!({
                    "op": OP_RESUME,
                    "d": { "token": self.token, "session_id": sid, "seq": s }
                })
                .to_string()
            }
            None => json!({
                "op": OP_IDENTIFY,
                "d": {
                    "token": self.token,
                    "intents": self.intents,
                    "properties": {
                        "os": std::env::consts::OS,
                        "browser": "relaybot",
                        "device": "relaybot"
                    }
                }
            })
            .to_string(),
        }
    }

    /// Spawn the heartbeat loop. Signals `zombie` if an ACK never arrives.
    fn spawn_heartbeat(
        &self,
        interval_ms: u64,
        ws_tx: mpsc::Sender<String>,
        zombie: Arc<Notify>,
    ) -> tokio::task::JoinHandle<()> {
        let seq = self.seq.clone();
        let acked = self.heartbeat_acked.clone();

        tokio::spawn(async move {
            // Initial jitter, as the gateway docs require
            let jitter = (interval_ms as f64 * rand::random::<f64>()) as u64;
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            loop {
                {
                    let mut acked = acked.lock().await;
                    if !*acked {
                        zombie.notify_one();
                        return;
                    }
                    *acked = false;
                }

                let s = *seq.lock().await;
                if ws_tx
                    .send(json!({"op": OP_HEARTBEAT, "d": s}).to_string())
                    .await
                    .is_err()
                {
                    return;
                }

                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        })
    }

    /// Handle a dispatch (op 0) event.
    async fn handle_dispatch(&self, event: &str, data: &Value) {
        match event {
            "READY" => {
                if let Some(sid) = data["session_id"].as_str() {
                    *self.session_id.lock().await = Some(sid.to_string());
                }
                if let Some(url) = data["resume_gateway_url"].as_str() {
                    *self.resume_url.lock().await = Some(url.to_string());
                }
                if let Some(id) = data["user"]["id"].as_str() {
                    *self.bot_user_id.write().await = Some(id.to_string());
                }
                let user = data["user"]["username"].as_str().unwrap_or("unknown");
                info!(user = user, "discord bot READY");
            }
            "RESUMED" => info!("discord session resumed"),
            "MESSAGE_CREATE" => self.handle_message_create(data).await,
            _ => debug!(event = event, "discord event (unhandled)"),
        }
    }

    /// Handle a MESSAGE_CREATE event from the Gateway.
    ///
    /// Bot-authored messages are forwarded with `author_is_bot` set; the
    /// router decides to ignore them.
    async fn handle_message_create(&self, data: &Value) {
        let Some(sender_id) = data["author"]["id"].as_str() else {
            return;
        };
        let Some(channel_id) = data["channel_id"].as_str() else {
            return;
        };

        let author_is_bot = data["author"]["bot"].as_bool().unwrap_or(false);

        if !author_is_bot && !self.is_allowed(sender_id) {
            warn!(
                sender = %sender_id,
                channel = %channel_id,
                "discord message from unauthorized user, ignoring"
            );
            return;
        }

        let content = data["content"].as_str().unwrap_or("");
        let is_direct = data["guild_id"].as_str().is_none();
        let mentions_bot = match self.bot_user_id.read().await.as_deref() {
            Some(me) => data["mentions"]
                .as_array()
                .is_some_and(|m| m.iter().any(|u| u["id"].as_str() == Some(me))),
            None => false,
        };

        let mut inbound = InboundMessage::new("discord", sender_id, channel_id, content);
        inbound.author_is_bot = author_is_bot;
        inbound.is_direct = is_direct;
        inbound.mentions_bot = mentions_bot;

        debug!(
            message_id = data["id"].as_str().unwrap_or("?"),
            sender = %sender_id,
            username = data["author"]["username"].as_str().unwrap_or("?"),
            channel = %channel_id,
            content_len = content.len(),
            author_is_bot,
            is_direct,
            mentions_bot,
            "discord inbound message"
        );

        if !author_is_bot && inbound.is_addressed() {
            self.start_typing(channel_id).await;
        }

        if let Err(e) = self.bus.publish_inbound(inbound).await {
            error!(error = %e, "failed to publish discord message to bus");
        }
    }

    /// Start typing indicator for a channel.
    async fn start_typing(&self, channel_id: &str) {
        self.stop_typing(channel_id).await;

        let url = format!("{DISCORD_API_BASE}/channels/{channel_id}/typing");
        let token = self.token.clone();
        let channel_id_owned = channel_id.to_string();
        let http = self.http.clone();

        let handle = tokio::spawn(async move {
            for _ in 0..MAX_TYPING_REFRESHES {
                let _ = http
                    .post(&url)
                    .header("Authorization", format!("Bot {token}"))
                    .send()
                    .await;
                tokio::time::sleep(Duration::from_secs(TYPING_INTERVAL_SECS)).await;
            }
            debug!(channel = %channel_id_owned, "typing indicator expired");
        });

        self.typing_tasks
            .write()
            .await
            .insert(channel_id.to_string(), handle);
    }

    /// Stop typing indicator for a channel.
    async fn stop_typing(&self, channel_id: &str) {
        if let Some(handle) = self.typing_tasks.write().await.remove(channel_id) {
            handle.abort();
        }
    }

    /// Stop all typing indicators.
    async fn stop_all_typing(&self) {
        let mut tasks = self.typing_tasks.write().await;
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }

    /// Send a message via the REST API with retry on rate-limit.
    async fn send_rest(&self, channel_id: &str, content: &str) -> anyhow::Result<()> {
        let url = format!("{DISCORD_API_BASE}/channels/{channel_id}/messages");
        let body = json!({ "content": content });

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let resp = self
                .http
                .post(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .json(&body)
                .send()
                .await?;

            let status = resp.status();

            if status.is_success() {
                return Ok(());
            }

            if status.as_u16() == 429 {
                let body_text = resp.text().await.unwrap_or_default();
                let retry_after = retry_after_secs(&body_text);
                warn!(
                    retry_after_s = retry_after,
                    attempt = attempts,
                    "discord rate limited"
                );
                tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                continue;
            }

            if attempts >= MAX_SEND_ATTEMPTS {
                let err_text = resp.text().await.unwrap_or_default();
                anyhow::bail!(
                    "discord send failed after {MAX_SEND_ATTEMPTS} attempts (HTTP {status}): {err_text}"
                );
            }

            warn!(
                status = %status,
                attempt = attempts,
                "discord send error, retrying in 1s"
            );
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

/// Parse `retry_after` (seconds) from a 429 body, defaulting to 1s.
fn retry_after_secs(body: &str) -> f64 {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["retry_after"].as_f64())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(1.0)
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> anyhow::Result<()> {
        if self.token.is_empty() {
            anyhow::bail!("discord token is empty");
        }

        info!("starting discord channel (gateway v10)");
        self.run_gateway().await
    }

    async fn stop(&self) -> anyhow::Result<()> {
        info!("stopping discord channel");
        self.shutdown.notify_waiters();
        self.stop_all_typing().await;
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()> {
        if msg.content.is_empty() {
            return Ok(());
        }

        let len = msg.content.chars().count();
        if len > DISCORD_MAX_LEN {
            self.stop_typing(&msg.chat_id).await;
            anyhow::bail!("message of {len} chars exceeds discord limit of {DISCORD_MAX_LEN}");
        }

        let result = self.send_rest(&msg.chat_id, &msg.content).await;

        self.stop_typing(&msg.chat_id).await;

        if result.is_ok() {
            debug!(chat_id = %msg.chat_id, len, "discord message sent");
        }
        result
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn create_channel(bus: Arc<MessageBus>, allowed: Vec<String>) -> DiscordChannel {
        DiscordChannel::new("test_token".into(), bus, allowed)
    }

    async fn ready(ch: &DiscordChannel, bot_id: &str) {
        ch.handle_dispatch(
            "READY",
            &json!({
                "session_id": "sess_1",
                "resume_gateway_url": "wss://resume.example",
                "user": { "id": bot_id, "username": "relaybot" }
            }),
        )
        .await;
    }

    #[test]
    fn test_channel_name() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        assert_eq!(ch.name(), "discord");
    }

    #[test]
    fn test_is_allowed() {
        let open = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        assert!(open.is_allowed("anyone"));

        let restricted = create_channel(
            Arc::new(MessageBus::new(8)),
            vec!["123456789".into(), "987654321".into()],
        );
        assert!(restricted.is_allowed("123456789"));
        assert!(!restricted.is_allowed("000000000"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(DISCORD_MAX_LEN, 2000);
        assert_eq!(DEFAULT_INTENTS, 37377);
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(retry_after_secs(r#"{"retry_after": 2.5}"#), 2.5);
        assert_eq!(retry_after_secs("garbage"), 1.0);
        assert_eq!(retry_after_secs(r#"{"retry_after": -3}"#), 1.0);
    }

    #[tokio::test]
    async fn test_ready_records_session_and_bot_id() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        ready(&ch, "bot_1").await;

        assert_eq!(ch.session_id.lock().await.as_deref(), Some("sess_1"));
        assert_eq!(
            ch.resume_url.lock().await.as_deref(),
            Some("wss://resume.example")
        );
        assert_eq!(ch.bot_user_id.read().await.as_deref(), Some("bot_1"));
    }

    #[tokio::test]
    async fn test_identify_then_resume_payload() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);

        let identify: Value = serde_json::from_str(&ch.identify_or_resume().await).unwrap();
        assert_eq!(identify["op"], OP_IDENTIFY);
        assert_eq!(identify["d"]["intents"], DEFAULT_INTENTS);

        ready(&ch, "bot_1").await;
        *ch.seq.lock().await = Some(42);

        let resume: Value = serde_json::from_str(&ch.identify_or_resume().await).unwrap();
        assert_eq!(resume["op"], OP_RESUME);
        assert_eq!(resume["d"]["session_id"], "sess_1");
        assert_eq!(resume["d"]["seq"], 42);
    }

    #[tokio::test]
    async fn test_guild_mention_sets_flags() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec![]);
        ready(&ch, "bot_1").await;

        ch.handle_message_create(&json!({
            "id": "msg1",
            "author": { "id": "user1", "username": "tester" },
            "channel_id": "ch1",
            "guild_id": "guild1",
            "content": "<@bot_1> hello",
            "mentions": [{ "id": "bot_1" }]
        }))
        .await;
        ch.stop_all_typing().await;

        let msg = bus.consume_inbound().await.unwrap();
        assert_eq!(msg.channel, "discord");
        assert_eq!(msg.sender_id, "user1");
        assert_eq!(msg.chat_id, "ch1");
        assert_eq!(msg.content, "<@bot_1> hello");
        assert!(msg.mentions_bot);
        assert!(!msg.is_direct);
        assert!(!msg.author_is_bot);
    }

    #[tokio::test]
    async fn test_mention_of_someone_else() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec![]);
        ready(&ch, "bot_1").await;

        ch.handle_message_create(&json!({
            "author": { "id": "user1" },
            "channel_id": "ch1",
            "guild_id": "guild1",
            "content": "<@other> hey",
            "mentions": [{ "id": "other" }]
        }))
        .await;

        let msg = bus.consume_inbound().await.unwrap();
        assert!(!msg.mentions_bot);
        assert!(!msg.is_addressed());
    }

    #[tokio::test]
    async fn test_direct_message_has_no_guild() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec![]);

        ch.handle_message_create(&json!({
            "author": { "id": "user1" },
            "channel_id": "dm1",
            "content": "flip a coin"
        }))
        .await;
        ch.stop_all_typing().await;

        let msg = bus.consume_inbound().await.unwrap();
        assert!(msg.is_direct);
        assert_eq!(msg.content, "flip a coin");
    }

    #[tokio::test]
    async fn test_bot_author_forwarded_with_flag() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec!["someone_else".into()]);

        ch.handle_message_create(&json!({
            "author": { "id": "bot_2", "bot": true },
            "channel_id": "ch1",
            "guild_id": "g",
            "content": "beep"
        }))
        .await;

        let msg = bus.consume_inbound().await.unwrap();
        assert!(msg.author_is_bot);
        assert!(ch.typing_tasks.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_user_dropped() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec!["123456789".into()]);

        ch.handle_message_create(&json!({
            "author": { "id": "000000000" },
            "channel_id": "ch1",
            "content": "hello"
        }))
        .await;

        let pending =
            tokio::time::timeout(Duration::from_millis(50), bus.consume_inbound()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_missing_ids_dropped() {
        let bus = Arc::new(MessageBus::new(8));
        let ch = create_channel(bus.clone(), vec![]);

        ch.handle_message_create(&json!({ "author": {}, "content": "x" }))
            .await;

        let pending =
            tokio::time::timeout(Duration::from_millis(50), bus.consume_inbound()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_typing_start_stop() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        ch.start_typing("channel_1").await;
        assert!(ch.typing_tasks.read().await.contains_key("channel_1"));

        ch.stop_typing("channel_1").await;
        assert!(!ch.typing_tasks.read().await.contains_key("channel_1"));
    }

    #[tokio::test]
    async fn test_send_rejects_oversized_content() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        let msg = OutboundMessage::new("discord", "ch1", "x".repeat(DISCORD_MAX_LEN + 1));

        let err = ch.send(&msg).await.unwrap_err();
        assert!(err.to_string().contains("exceeds discord limit"));
    }

    #[tokio::test]
    async fn test_send_empty_is_noop() {
        let ch = create_channel(Arc::new(MessageBus::new(8)), vec![]);
        let msg = OutboundMessage::new("discord", "ch1", "");
        assert!(ch.send(&msg).await.is_ok());
    }
}
