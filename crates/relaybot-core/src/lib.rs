//! Relaybot Core — types and plumbing shared by every other crate.
//!
//! - **types**: conversation turns and the chat-completions wire format
//! - **bus**: inbound/outbound message queues between channels and the router
//! - **config**: JSON config schema, loader, and env overrides
//! - **conversation**: per-channel bounded history used as model context

pub mod bus;
pub mod config;
pub mod conversation;
pub mod types;
pub mod utils;

pub use conversation::ConversationStore;
pub use types::{Role, Turn};
