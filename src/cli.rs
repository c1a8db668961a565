//! Command-line interface definition for Healthchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and history management.

use clap::{Parser, Subcommand};

/// Healthchat - streaming healthcare information assistant
///
/// Chat with a model that answers general health questions, with every
/// conversation kept in a local history store.
#[derive(Parser, Debug, Clone)]
#[command(name = "healthchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the chat history database location
    #[arg(long, global = true)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Healthchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat
    Chat {
        /// Override the provider from config (gemini, fake)
        #[arg(short, long)]
        provider: Option<String>,

        /// Resume a saved session by id or unique id prefix
        #[arg(short, long)]
        session: Option<String>,

        /// Keep this chat in memory only
        #[arg(short, long)]
        ephemeral: bool,
    },

    /// Inspect and manage saved chat sessions
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryCommand {
    /// List saved sessions, most recent first
    List,

    /// Print every message of a session
    Show {
        /// Session id or unique id prefix
        id: String,
    },

    /// Delete a session
    Delete {
        /// Session id or unique id prefix
        id: String,
    },

    /// Delete every saved session
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::History {
                command: HistoryCommand::List,
            },
        }
    }
}
