//! Message routing for Relaybot.
//!
//! # Architecture
//!
//! - [`filter::ContentFilter`] — pluggable blocked-text classifier ([`filter::Blocklist`])
//! - [`chunker::chunk`] — splits replies to fit the platform length ceiling
//! - [`madlibs::MadLibsSession`] — the fill-in-the-blank game state machine
//! - [`random::RandomSource`] — injectable randomness for the shortcut replies
//! - [`sink::ReplySink`] — where replies go (the message bus in production)
//! - [`router::MessageRouter`] — the decision tree tying it all together

pub mod chunker;
pub mod filter;
pub mod madlibs;
pub mod random;
pub mod router;
pub mod sink;

pub use chunker::{chunk, DISCORD_MESSAGE_LIMIT};
pub use filter::{Blocklist, ContentFilter, DEFAULT_BLOCKLIST};
pub use madlibs::{InvalidStateError, MadLibsSession, SessionState};
pub use random::{RandomSource, ThreadRandom};
pub use router::MessageRouter;
pub use sink::{ReplySink, SendError};
