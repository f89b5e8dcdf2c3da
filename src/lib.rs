//! NexusChat - terminal client for the CodeNexus career assistant
//!
//! This library reconstructs conversations from the backend's flat chat
//! history and drives an interactive chat on top of them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Exchange and session types, and rebuilding sessions from history
//! - `controller`: Chat state machine (current conversation, send, history load)
//! - `client`: Backend abstraction and the `reqwest` implementation
//! - `auth`: Credential providers (static token, OS keyring)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind each CLI command
//!
//! # Example
//!
//! ```no_run
//! use nexuschat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let controller = nexuschat::commands::build_controller(&config)?;
//!     controller.load_history().await;
//!     for session in controller.sessions() {
//!         println!("{} {}", session.id, session.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use controller::{ChatController, HistoryLoad, SendOutcome};
pub use error::{NexusError, Result};
pub use session::{build_sessions, filter_sessions, ChatExchange, ChatMessage, ConversationSession};

#[cfg(test)]
pub mod test_utils;
