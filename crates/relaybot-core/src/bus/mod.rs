//! Message bus — typed events plus the tokio mpsc queues that carry them.

pub mod queue;
pub mod types;

pub use queue::MessageBus;
pub use types::{InboundMessage, OutboundMessage};
