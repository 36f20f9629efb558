//! In-memory conversation store keyed by chat id.

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::types::Turn;

/// Per-channel, append-only, optionally bounded conversation history.
///
/// Thread-safe via `RwLock` — multiple readers, exclusive writer. The lock is
/// never held across an `.await`.
#[derive(Debug)]
pub struct ConversationStore {
    histories: RwLock<HashMap<String, VecDeque<Turn>>>,
    /// Maximum turns kept per channel. `0` = unbounded.
    max_turns: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl ConversationStore {
    /// Create a store that keeps at most `max_turns` turns per channel,
    /// evicting the oldest first. `0` disables the bound.
    pub fn new(max_turns: usize) -> Self {
        ConversationStore {
            histories: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Create a store with no eviction.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Append a turn, creating the channel's history if absent.
    pub fn append(&self, chat_id: &str, turn: Turn) {
        let mut histories = self.write();
        let history = histories.entry(chat_id.to_string()).or_default();
        history.push_back(turn);

        if self.max_turns > 0 {
            while history.len() > self.max_turns {
                history.pop_front();
            }
        }

        debug!(chat_id = %chat_id, turns = history.len(), "history appended");
    }

    /// Snapshot of a channel's history in conversational order.
    ///
    /// Empty if the channel has never interacted.
    pub fn get(&self, chat_id: &str) -> Vec<Turn> {
        self.read()
            .get(chat_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of turns recorded for a channel.
    pub fn len(&self, chat_id: &str) -> usize {
        self.read().get(chat_id).map_or(0, VecDeque::len)
    }

    /// Number of channels with any history.
    pub fn channel_count(&self) -> usize {
        self.read().len()
    }

    /// Configured bound (`0` = unbounded).
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, VecDeque<Turn>>> {
        self.histories.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, VecDeque<Turn>>> {
        self.histories.write().unwrap_or_else(|e| e.into_inner())
    }
}
