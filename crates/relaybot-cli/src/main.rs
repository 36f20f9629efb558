//! Relaybot CLI — entry point.
//!
//! # Commands
//!
//! - `relaybot gateway [--logs]` — run the Discord gateway + router
//! - `relaybot chat [--logs]` — talk to the router from a local REPL
//! - `relaybot status` — show configuration and credential status
//! - `relaybot init` — write a default config file

mod gateway;
mod helpers;
mod init;
mod repl;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Relaybot — a Discord relay bot for OpenAI-compatible chat models
#[derive(Parser)]
#[command(name = "relaybot", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.relaybot/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and relay messages until Ctrl+C
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat with the router locally (every line is a direct message)
    Chat {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and credential status
    Status,

    /// Write a default config file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Gateway { logs } => {
            init_logging(logs);
            gateway::run(config_path.as_deref()).await
        }
        Commands::Chat { logs } => {
            init_logging(logs);
            repl::run(config_path.as_deref()).await
        }
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Init => init::run(config_path.as_deref()),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("relaybot=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
