//! Command-line interface definition for nexuschat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, history browsing, one-shot
//! sends, and credential management.

use clap::{Parser, Subcommand};

/// nexuschat - CodeNexus career assistant in the terminal
///
/// Chat with the CodeNexus assistant and browse past conversations.
#[derive(Parser, Debug, Clone)]
#[command(name = "nexuschat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for nexuschat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume a past conversation by id (or unique id prefix)
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Browse past conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,
    },

    /// Manage the stored credential
    Auth {
        /// Auth subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List conversations, most recent first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List conversations whose title contains the query (case-insensitive)
    Search {
        /// Text to look for in titles
        query: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the transcript of one conversation
    Show {
        /// Conversation id (or unique id prefix)
        id: String,
    },
}

/// Credential subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Store a bearer token in the OS keyring
    Login {
        /// Token issued by the identity provider
        #[arg(long)]
        token: String,

        /// Seconds until the token expires
        #[arg(long)]
        expires_in: Option<i64>,
    },

    /// Remove the stored token
    Logout,

    /// Report whether a token is available
    Status,
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
            api_url: None,
            verbose: false,
            json_logs: false,
            command: Commands::Chat { resume: None },
        }
    }
}
