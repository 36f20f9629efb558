//! Relaybot Channels — chat gateway integrations.
//!
//! This crate provides:
//! - **base**: The `Channel` trait every gateway implementation satisfies
//! - **manager**: `ChannelManager` — lifecycle orchestration and outbound delivery
//! - **discord** (feature `discord`, on by default): Discord Gateway v10 + REST

pub mod base;
pub mod manager;

#[cfg(feature = "discord")]
pub mod discord;

pub use base::Channel;
pub use manager::ChannelManager;
