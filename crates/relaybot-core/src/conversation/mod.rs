//! Per-channel conversation history used as language-model context.
//!
//! In memory only; history does not survive a restart.

pub mod store;

pub use store::ConversationStore;
