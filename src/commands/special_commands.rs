//! Special commands parser for interactive chat mode
//!
//! Special commands manage the conversation list rather than being sent to
//! the assistant. They let the user:
//! - Start a new conversation
//! - List, search, and switch between past conversations
//! - Reload history from the backend
//! - View status and help
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive; arguments keep
//! their original case.

use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new conversation on the next message
    NewConversation,

    /// List known conversations
    ListSessions,

    /// Switch to a conversation by id or unique prefix
    SwitchSession(String),

    /// List conversations whose title contains the query
    Search(String),

    /// Re-fetch history from the backend
    Reload,

    /// Show the active conversation and connection state
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to the assistant
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognized `/` command
/// and `CommandError::MissingArgument` when `/switch` or `/search` has no
/// argument.
///
/// # Examples
///
/// ```
/// use nexuschat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewConversation);
/// assert_eq!(
///     parse_special_command("/search Resume").unwrap(),
///     SpecialCommand::Search("Resume".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/new" | "/clear" => Ok(SpecialCommand::NewConversation),
        "/sessions" | "/history" | "/ls" => Ok(SpecialCommand::ListSessions),
        "/reload" => Ok(SpecialCommand::Reload),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/switch" | "/open" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/switch".to_string(),
                    usage: "/switch <session-id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::SwitchSession(arg.to_string()))
            }
        }
        "/search" | "/find" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/search".to_string(),
                    usage: "/search <text>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Search(arg.to_string()))
            }
        }
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the interactive commands
pub fn print_help() {
    println!();
    println!("{}", "Conversation commands".bold());
    println!("  {}            start a new conversation", "/new".cyan());
    println!("  {}       list past conversations", "/sessions".cyan());
    println!("  {}    switch to a conversation (id or prefix)", "/switch <id>".cyan());
    println!("  {}  find conversations by title", "/search <text>".cyan());
    println!("  {}         re-fetch history from the server", "/reload".cyan());
    println!();
    println!("{}", "Other".bold());
    println!("  {}         show the active conversation", "/status".cyan());
    println!("  {}           show this help", "/help".cyan());
    println!("  {}     leave the chat", "exit, quit".cyan());
    println!();
}
