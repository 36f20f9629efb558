//! `relaybot chat` — a local REPL in front of the router.
//!
//! Each line is delivered as a direct message on chat id `cli:local`, except
//! while a Mad Libs game is running: then lines go in as plain channel
//! messages so they fill the blanks.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use relaybot_core::bus::types::{InboundMessage, OutboundMessage};
use relaybot_core::config::load_config;
use relaybot_core::utils::truncate_string;
use relaybot_router::{MessageRouter, ReplySink, SendError};

use crate::helpers;

/// Channel name and chat id used for REPL messages.
const CLI_CHANNEL: &str = "cli";
const CLI_CHAT_ID: &str = "cli:local";

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Collects the router's replies for one input line.
#[derive(Default)]
struct ReplyBuffer {
    replies: Mutex<Vec<String>>,
}

impl ReplyBuffer {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl ReplySink for ReplyBuffer {
    async fn send_text(&self, reply: OutboundMessage) -> Result<(), SendError> {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reply.content);
        Ok(())
    }
}

/// Run the interactive REPL loop.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let buffer = Arc::new(ReplyBuffer::default());
    let router = helpers::build_router(&config, buffer.clone())?;

    helpers::print_banner("chat");
    if !config.model.is_configured() {
        println!(
            "{}",
            "  model.apiKey is not set: only the built-in shortcuts will answer.".yellow()
        );
    }
    println!(
        "{}",
        "  Type a message, \"!madlibs\" to play, or \"exit\" to quit.".dimmed()
    );
    println!();

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = %truncate_string(trimmed, 80), "processing input");
        let replies = exchange(&router, &buffer, trimmed).await;
        helpers::print_replies(&replies);
    }

    save_history(&mut editor);

    Ok(())
}

/// Route one line and return everything the router sent back.
async fn exchange(router: &MessageRouter, buffer: &ReplyBuffer, line: &str) -> Vec<String> {
    router.handle(&inbound_for(router, line)).await;
    buffer.take()
}

/// Build the inbound message for a REPL line.
fn inbound_for(router: &MessageRouter, line: &str) -> InboundMessage {
    let msg = InboundMessage::new(CLI_CHANNEL, "local", CLI_CHAT_ID, line);
    if router.has_active_game(CLI_CHAT_ID) {
        msg
    } else {
        msg.direct()
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    relaybot_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
