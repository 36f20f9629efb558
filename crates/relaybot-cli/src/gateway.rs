//! Gateway command — wires Discord, the message bus, and the router.
//!
//! Startup sequence:
//! 1. Load config, refuse to start without both credentials
//! 2. Create message bus
//! 3. Create router (HTTP model provider, bus as reply sink)
//! 4. Create channel manager, register Discord
//! 5. Run router + channel manager until Ctrl+C, then drain the router

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use relaybot_channels::ChannelManager;
use relaybot_core::bus::queue::MessageBus;
use relaybot_core::config::{get_config_path, load_config};

use crate::helpers;

/// Run the gateway until Ctrl+C.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    helpers::print_banner("gateway");

    let config = load_config(config_path);
    let shown_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);
    config
        .validate_credentials()
        .with_context(|| format!("cannot start gateway (config: {})", shown_path.display()))?;

    let bus = Arc::new(MessageBus::new(config.bus.capacity));

    let router = Arc::new(helpers::build_router(&config, bus.clone())?);

    #[allow(unused_mut)]
    let mut channel_manager = ChannelManager::new(bus.clone());

    #[cfg(feature = "discord")]
    {
        use relaybot_channels::discord::DiscordChannel;
        let dc = &config.discord;
        let discord = DiscordChannel::new(dc.token.clone(), bus.clone(), dc.allowed_users.clone());
        channel_manager.register(Arc::new(discord));
    }

    info!(
        model = %config.model.model,
        channels = ?channel_manager.channel_names(),
        history_limit = config.router.history_limit,
        "gateway starting"
    );

    println!("  Model:     {}", config.model.model);
    println!("  Channels:  {} registered", channel_manager.len());
    if channel_manager.is_empty() {
        println!("  ⚠  No channels compiled in; rebuild with --features discord");
    }
    println!();
    println!("  Ctrl+C to stop");
    println!();

    let router_task = tokio::spawn(router.clone().run(bus.clone()));

    tokio::select! {
        result = channel_manager.start_all() => {
            if let Err(e) = result {
                error!(error = %e, "channel manager error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
        }
    }

    // Drain the router while the channels can still deliver its replies
    router.stop();
    if let Err(e) = router_task.await {
        error!(error = %e, "router task failed");
    }
    channel_manager.stop_all().await;

    println!("  Gateway stopped. Goodbye!");
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_to_start_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"discord": {"token": ""}, "model": {"apiKey": ""}}"#).unwrap();

        // Env fallbacks would satisfy validation
        if std::env::var("DISCORD_TOKEN").is_ok() || std::env::var("RELAYBOT_DISCORD__TOKEN").is_ok() {
            return;
        }

        let err = run(Some(&path)).await.unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("cannot start gateway"), "{chain}");
        assert!(chain.contains("discord.token"), "{chain}");
    }
}
