//! Message router — the decision tree between an inbound message and its reply.
//!
//! For each message, exactly one of: ignore, canned reply, Mad Libs step,
//! or model-backed reply. Every reply is chunked to the configured length
//! ceiling before it reaches the [`ReplySink`].
//!
//! [`MessageRouter::run`] serialises processing per chat id: one worker task
//! per channel, channels run concurrently. Idle workers are retired and
//! respawned on the next message.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;

use regex::Regex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use relaybot_core::bus::queue::MessageBus;
use relaybot_core::bus::types::{InboundMessage, OutboundMessage};
use relaybot_core::config::{ModelConfig, RouterConfig};
use relaybot_core::conversation::ConversationStore;
use relaybot_core::types::Turn;
use relaybot_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::chunker::{chunk, DISCORD_MESSAGE_LIMIT};
use crate::filter::{Blocklist, ContentFilter};
use crate::madlibs::{InvalidStateError, MadLibsSession};
use crate::random::{RandomSource, ThreadRandom};
use crate::sink::ReplySink;

/// Sent instead of a reply when the question trips the content filter.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I cannot respond to messages with inappropriate language.";

/// Sent when the model call fails or times out.
pub const MODEL_ERROR_REPLY: &str =
    "An error occurred while fetching the response from the language model.";

/// Messages queued per channel before the dispatcher waits.
const WORKER_QUEUE_SIZE: usize = 32;

/// A channel worker with no traffic for this long is retired.
const WORKER_IDLE: Duration = Duration::from_secs(600);

/// How long [`MessageRouter::run`] waits for workers to finish on exit.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A leading `<@id>` / `<@!id>` mention.
static LEADING_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<@!?\d+>").expect("mention pattern is valid"));

/// Strip a leading bot mention and surrounding whitespace.
fn strip_mention(content: &str) -> &str {
    match LEADING_MENTION.find(content) {
        Some(m) => content[m.end()..].trim(),
        None => content.trim(),
    }
}

/// Outcome of feeding one word into a game.
enum GameStep {
    Story(String),
    Next(&'static str),
}

fn advance_game(session: &mut MadLibsSession, input: &str) -> Result<GameStep, InvalidStateError> {
    session.add_input(input)?;
    if session.is_complete() {
        Ok(GameStep::Story(session.render_story()?))
    } else {
        Ok(GameStep::Next(session.next_input_label()?))
    }
}

/// One channel's queue into its worker task.
struct Worker {
    tx: mpsc::Sender<InboundMessage>,
    handle: JoinHandle<()>,
    last_used: Instant,
}

/// Decrements the live-worker count when a worker task ends, panics included.
struct LiveWorker<'a>(&'a AtomicUsize);

impl Drop for LiveWorker<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────
// MessageRouter
// ─────────────────────────────────────────────

/// Routes inbound messages to canned replies, games, or the language model.
pub struct MessageRouter {
    /// Completion API.
    provider: Arc<dyn LlmProvider>,
    /// Where reply chunks go.
    sink: Arc<dyn ReplySink>,
    filter: Arc<dyn ContentFilter>,
    random: Arc<dyn RandomSource>,
    /// Per-channel history used as model context.
    store: Arc<ConversationStore>,
    /// Active Mad Libs games, at most one per chat id.
    games: Mutex<HashMap<String, MadLibsSession>>,
    /// Model identifier sent with each request.
    model: String,
    request_config: LlmRequestConfig,
    system_prompt: Option<String>,
    model_timeout: Duration,
    max_message_length: usize,
    record_shortcut_replies: bool,
    worker_idle: Duration,
    live_workers: AtomicUsize,
    shutdown: Notify,
}

impl MessageRouter {
    /// Create a router from the `model` and `router` config sections.
    ///
    /// Uses the built-in blocklist (plus configured extra terms), the
    /// thread-local RNG, and a store bounded by `history_limit`.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sink: Arc<dyn ReplySink>,
        model: &ModelConfig,
        router: &RouterConfig,
    ) -> Self {
        let model_name = if model.model.is_empty() {
            provider.default_model().to_string()
        } else {
            model.model.clone()
        };

        let max_message_length = if router.max_message_length > DISCORD_MESSAGE_LIMIT {
            warn!(
                configured = router.max_message_length,
                limit = DISCORD_MESSAGE_LIMIT,
                "maxMessageLength above the Discord limit, clamping"
            );
            DISCORD_MESSAGE_LIMIT
        } else {
            router.max_message_length
        };

        info!(
            provider = provider.display_name(),
            model = %model_name,
            history_limit = router.history_limit,
            max_message_length,
            "message router initialized"
        );

        Self {
            provider,
            sink,
            filter: Arc::new(Blocklist::with_extra_terms(&router.extra_blocked_terms)),
            random: Arc::new(ThreadRandom),
            store: Arc::new(ConversationStore::new(router.history_limit)),
            games: Mutex::new(HashMap::new()),
            model: model_name,
            request_config: LlmRequestConfig {
                max_tokens: model.max_tokens,
                temperature: model.temperature,
            },
            system_prompt: model.system_prompt.clone().filter(|p| !p.trim().is_empty()),
            model_timeout: Duration::from_secs(model.timeout_secs.max(1)),
            max_message_length,
            record_shortcut_replies: router.record_shortcut_replies,
            worker_idle: WORKER_IDLE,
            live_workers: AtomicUsize::new(0),
            shutdown: Notify::new(),
        }
    }

    /// Replace the content filter.
    pub fn with_filter(mut self, filter: Arc<dyn ContentFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the random source.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Share an existing conversation store.
    pub fn with_store(mut self, store: Arc<ConversationStore>) -> Self {
        self.store = store;
        self
    }

    /// Override the model call timeout.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// Override how long a quiet channel keeps its worker.
    pub fn with_worker_idle(mut self, idle: Duration) -> Self {
        self.worker_idle = idle.max(Duration::from_millis(1));
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Whether a Mad Libs game is running in `chat_id`.
    pub fn has_active_game(&self, chat_id: &str) -> bool {
        self.games().contains_key(chat_id)
    }

    /// Signal [`run`](Self::run) to stop taking new messages.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Channel worker tasks currently alive.
    pub fn worker_count(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Consume the bus inbound queue until [`stop`](Self::stop) is called or
    /// the queue closes.
    ///
    /// Messages for the same chat id are handled strictly in arrival order;
    /// distinct chat ids are handled concurrently. A channel with no traffic
    /// for the idle period loses its worker. On exit, messages already handed
    /// to workers are processed for up to [`SHUTDOWN_GRACE`] before `run`
    /// returns.
    pub async fn run(self: Arc<Self>, bus: Arc<MessageBus>) {
        info!("message router started, waiting for messages");
        let mut workers: HashMap<String, Worker> = HashMap::new();
        let mut retiring: HashMap<String, JoinHandle<()>> = HashMap::new();

        let mut sweep = tokio::time::interval(self.worker_idle);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = bus.consume_inbound() => {
                    let Some(msg) = msg else {
                        info!("inbound bus closed, router exiting");
                        break;
                    };
                    Self::dispatch(&self, &mut workers, &mut retiring, msg).await;
                }
                _ = sweep.tick() => {
                    Self::reap_idle(&mut workers, &mut retiring, self.worker_idle);
                }
                _ = self.shutdown.notified() => {
                    info!("router received shutdown signal");
                    break;
                }
            }
        }

        // Dropping the senders lets each worker finish its queue and exit
        let mut handles: Vec<JoinHandle<()>> = workers.into_values().map(|w| w.handle).collect();
        handles.extend(retiring.into_values());
        debug!(workers = handles.len(), "draining channel workers");

        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "channel workers still busy after shutdown grace, abandoning"
            );
        }
    }

    /// Hand a message to its channel's worker, spawning one if needed.
    async fn dispatch(
        router: &Arc<Self>,
        workers: &mut HashMap<String, Worker>,
        retiring: &mut HashMap<String, JoinHandle<()>>,
        msg: InboundMessage,
    ) {
        let chat_id = msg.chat_id.clone();
        let worker = match workers.entry(chat_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let previous = retiring.remove(&chat_id);
                entry.insert(Self::spawn_worker(router.clone(), &chat_id, previous))
            }
        };
        worker.last_used = Instant::now();

        let sent = worker.tx.send(msg).await;
        if let Err(mpsc::error::SendError(msg)) = sent {
            // Worker is gone (it panicked); start a fresh one
            warn!(chat_id = %chat_id, "channel worker died, respawning");
            let dead = std::mem::replace(worker, Self::spawn_worker(router.clone(), &chat_id, None));
            dead.handle.abort();
            if worker.tx.send(msg).await.is_err() {
                error!(chat_id = %chat_id, "failed to hand message to channel worker");
            }
        }
    }

    /// Drop workers that have seen no message for `idle`.
    fn reap_idle(
        workers: &mut HashMap<String, Worker>,
        retiring: &mut HashMap<String, JoinHandle<()>>,
        idle: Duration,
    ) {
        retiring.retain(|_, handle| !handle.is_finished());

        let idle_ids: Vec<String> = workers
            .iter()
            .filter(|(_, w)| w.last_used.elapsed() >= idle)
            .map(|(id, _)| id.clone())
            .collect();

        for chat_id in idle_ids {
            if let Some(worker) = workers.remove(&chat_id) {
                debug!(chat_id = %chat_id, "retiring idle channel worker");
                retiring.insert(chat_id, worker.handle);
            }
        }
    }

    /// Spawn a worker for `chat_id`. It starts only once `previous` (a
    /// retired worker for the same channel) has finished.
    fn spawn_worker(
        router: Arc<Self>,
        chat_id: &str,
        previous: Option<JoinHandle<()>>,
    ) -> Worker {
        let (tx, mut rx) = mpsc::channel::<InboundMessage>(WORKER_QUEUE_SIZE);
        let chat_id = chat_id.to_string();
        debug!(chat_id = %chat_id, "spawning channel worker");
        router.live_workers.fetch_add(1, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let _live = LiveWorker(&router.live_workers);
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            while let Some(msg) = rx.recv().await {
                router.handle(&msg).await;
            }
            debug!(chat_id = %chat_id, "channel worker exiting");
        });

        Worker {
            tx,
            handle,
            last_used: Instant::now(),
        }
    }

    /// Process one message to completion.
    pub async fn handle(&self, msg: &InboundMessage) {
        if msg.author_is_bot {
            debug!(sender = %msg.sender_id, "ignoring bot-authored message");
            return;
        }

        if !msg.is_addressed() {
            self.continue_game(msg).await;
            return;
        }

        let question = strip_mention(&msg.content);
        debug!(chat_id = %msg.chat_id, question = %question, "addressed message");

        if self.filter.is_blocked(question) {
            info!(chat_id = %msg.chat_id, sender = %msg.sender_id, "blocked content, sending apology");
            self.reply(msg, APOLOGY_REPLY).await;
            return;
        }

        self.store.append(&msg.chat_id, Turn::user(question));

        let lowered = question.to_lowercase();

        if lowered.contains("how many") || lowered.contains("how much") {
            let n = self.random.number_in(1, 100);
            self.shortcut_reply(msg, format!("There are {n}.")).await;
            return;
        }

        if lowered == "flip a coin" {
            let side = if self.random.coin_flip() { "Heads" } else { "Tails" };
            self.shortcut_reply(msg, format!("I flipped a coin, and it's {side}!"))
                .await;
            return;
        }

        if lowered == "!madlibs" {
            self.start_game(msg).await;
            return;
        }

        self.model_reply(msg).await;
    }

    /// Feed a non-addressed message to the channel's game, if any.
    async fn continue_game(&self, msg: &InboundMessage) {
        let reply = {
            let mut games = self.games();
            let Some(session) = games.get_mut(&msg.chat_id) else {
                debug!(chat_id = %msg.chat_id, "not addressed and no active game, ignoring");
                return;
            };

            match advance_game(session, &msg.content) {
                Ok(GameStep::Story(story)) => {
                    games.remove(&msg.chat_id);
                    info!(chat_id = %msg.chat_id, "mad libs game complete");
                    format!("Here's your Mad Libs story:\n{story}")
                }
                Ok(GameStep::Next(label)) => format!("Great! Give me a {label}:"),
                Err(e) => {
                    debug_assert!(false, "mad libs session out of sequence: {e}");
                    error!(chat_id = %msg.chat_id, error = %e, "mad libs session out of sequence, dropping game");
                    games.remove(&msg.chat_id);
                    return;
                }
            }
        };

        self.reply(msg, &reply).await;
    }

    /// Start (or restart) a game in the message's channel.
    async fn start_game(&self, msg: &InboundMessage) {
        let session = MadLibsSession::new();
        let label = match session.next_input_label() {
            Ok(label) => label,
            Err(e) => {
                error!(error = %e, "new mad libs session has no first input");
                return;
            }
        };

        if self.games().insert(msg.chat_id.clone(), session).is_some() {
            debug!(chat_id = %msg.chat_id, "replacing running mad libs game");
        }
        info!(chat_id = %msg.chat_id, "mad libs game started");

        self.shortcut_reply(msg, format!("Let's play Mad Libs! Give me a {label}:"))
            .await;
    }

    /// Send a canned reply, recording it as an assistant turn if configured.
    async fn shortcut_reply(&self, msg: &InboundMessage, text: String) {
        debug!(chat_id = %msg.chat_id, reply = %text, "shortcut reply");
        self.reply(msg, &text).await;
        if self.record_shortcut_replies {
            self.store.append(&msg.chat_id, Turn::assistant(text));
        }
    }

    /// Ask the model with the channel's full history and relay the answer.
    async fn model_reply(&self, msg: &InboundMessage) {
        let history = self.store.get(&msg.chat_id);
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Turn::system(prompt));
        }
        messages.extend(history);

        info!(
            chat_id = %msg.chat_id,
            model = %self.model,
            turns = messages.len(),
            "calling language model"
        );

        let call = self
            .provider
            .chat(&messages, &self.model, &self.request_config);

        match tokio::time::timeout(self.model_timeout, call).await {
            Ok(Ok(response)) => {
                self.reply(msg, &response.content).await;
                self.store
                    .append(&msg.chat_id, Turn::assistant(response.content));
            }
            Ok(Err(e)) => {
                warn!(chat_id = %msg.chat_id, error = %e, "model call failed");
                self.reply(msg, MODEL_ERROR_REPLY).await;
            }
            Err(_) => {
                warn!(
                    chat_id = %msg.chat_id,
                    timeout_secs = self.model_timeout.as_secs_f64(),
                    "model call timed out"
                );
                self.reply(msg, MODEL_ERROR_REPLY).await;
            }
        }
    }

    /// Chunk and send. The first failed chunk drops the rest of the reply.
    async fn reply(&self, msg: &InboundMessage, text: &str) {
        let chunks = chunk(text, self.max_message_length);
        let total = chunks.len();

        for (i, part) in chunks.into_iter().enumerate() {
            if let Err(e) = self.sink.send_text(OutboundMessage::reply_to(msg, part)).await {
                warn!(
                    chat_id = %msg.chat_id,
                    chunk = i + 1,
                    total,
                    error = %e,
                    "failed to send reply, dropping remaining chunks"
                );
                return;
            }
        }
    }

    fn games(&self) -> MutexGuard<'_, HashMap<String, MadLibsSession>> {
        self.games.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
