/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`    interactive chat mode
- `send`    one message, one reply
- `history` browse past conversations
- `auth`    store or remove the bearer token

Every handler builds its [`ChatController`] through [`build_controller`], so
the HTTP client and credential provider come from configuration in one place.
*/

use crate::auth::provider_from_config;
use crate::client::HttpChatClient;
use crate::config::Config;
use crate::controller::ChatController;
use crate::error::Result;
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// History browsing commands
pub mod history;

/// Build a controller wired to the configured backend and credential source
///
/// # Errors
///
/// Returns error if the HTTP client cannot be constructed from `config.api`.
pub fn build_controller(config: &Config) -> Result<ChatController> {
    let backend = HttpChatClient::new(&config.api)?;
    let credentials = provider_from_config(&config.auth);
    Ok(ChatController::new(Arc::new(backend), credentials)
        .with_title_max_chars(config.chat.title_max_chars))
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Runs a readline loop over a [`ChatController`]. History loads in the
    //! background while the user types; if they start talking first the
    //! controller discards the stale result.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::controller::{HistoryLoad, RejectReason, SendOutcome};
    use crate::error::NexusError;
    use crate::session::{ChatMessage, ConversationSession};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `resume` - Optional session id or unique prefix to open first
    ///
    /// # Errors
    ///
    /// Returns error if the controller cannot be built, the terminal cannot
    /// be opened, or `resume` names no known conversation.
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let controller = build_controller(&config)?;

        // Resuming needs the session list up front; otherwise load it
        // behind the prompt.
        let mut background_load = None;
        match &resume {
            Some(id) => {
                report_history_load(&controller.load_history().await);
                let session_id = controller.find_session_id(id).ok_or_else(|| {
                    NexusError::Command(format!("No conversation matches '{}'", id))
                })?;
                controller.select_session(&session_id);
            }
            None => {
                let loader = controller.clone();
                background_load = Some(tokio::spawn(async move { loader.load_history().await }));
            }
        }

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config);
        if resume.is_some() {
            print_transcript(&controller.messages());
        }

        loop {
            if let Some(result) = take_finished_load(&mut background_load).await {
                report_history_load(&result);
            }
            let prompt = format_prompt(&controller);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewConversation => {
                            controller.start_new_conversation();
                            println!("{}\n", "Started a new conversation.".green());
                        }
                        SpecialCommand::ListSessions => {
                            print_session_list(&controller.sessions(), controller.current_session_id());
                        }
                        SpecialCommand::Search(query) => {
                            let found = controller.filter_sessions(&query);
                            if found.is_empty() {
                                println!("{}\n", format!("No conversations match '{}'.", query).yellow());
                            } else {
                                print_session_list(&found, controller.current_session_id());
                            }
                        }
                        SpecialCommand::SwitchSession(id) => match controller.find_session_id(&id) {
                            Some(session_id) => {
                                controller.select_session(&session_id);
                                if let Some(session) = controller.current_session() {
                                    println!("Switched to {}\n", session.title.bold());
                                }
                                print_transcript(&controller.messages());
                            }
                            None => {
                                eprintln!(
                                    "{}\n",
                                    format!("No single conversation matches '{}'. Try /sessions.", id)
                                        .red()
                                );
                            }
                        },
                        SpecialCommand::Reload => {
                            report_history_load(&controller.load_history().await);
                        }
                        SpecialCommand::ShowStatus => {
                            let history_pending = background_load
                                .as_ref()
                                .is_some_and(|handle| !handle.is_finished());
                            print_status_display(&controller, &config, history_pending);
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => send_interactive(&controller, trimmed).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(handle) = background_load {
            handle.abort();
        }
        println!("Goodbye!");
        Ok(())
    }

    /// Result of the background history load, once it has finished
    ///
    /// Leaves `slot` untouched while the load is still running.
    async fn take_finished_load(slot: &mut Option<JoinHandle<HistoryLoad>>) -> Option<HistoryLoad> {
        if !slot.as_ref().is_some_and(|handle| handle.is_finished()) {
            return None;
        }
        match slot.take()?.await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!("Background history load did not complete: {}", e);
                None
            }
        }
    }

    /// Send one message, letting CTRL-C cancel the wait for the reply
    async fn send_interactive(controller: &ChatController, text: &str) {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        println!("{}", "Thinking... (CTRL-C to cancel)".dimmed());
        let outcome = controller.send_message_with_cancel(text, &cancel).await;
        watcher.abort();

        match outcome {
            SendOutcome::Delivered { reply } => println!("\n{}\n", reply),
            SendOutcome::Failed { error } => {
                eprintln!("{}\n", ChatMessage::error(&error).content.red())
            }
            SendOutcome::Cancelled => println!("{}\n", "Request cancelled.".yellow()),
            SendOutcome::Rejected(RejectReason::Pending) => {
                println!("{}\n", "Still waiting for the previous reply.".yellow())
            }
            SendOutcome::Rejected(RejectReason::Empty) => {}
        }
    }

    fn report_history_load(result: &HistoryLoad) {
        match result {
            HistoryLoad::Loaded { sessions } => {
                println!("{}", format!("Loaded {} conversations.", sessions).green())
            }
            HistoryLoad::Unauthenticated => println!(
                "{}",
                "Not signed in; past conversations are unavailable. Run 'nexuschat auth login'."
                    .yellow()
            ),
            HistoryLoad::Stale => println!(
                "{}",
                "History changed while loading; run /reload to try again.".yellow()
            ),
            HistoryLoad::Failed(error) => {
                eprintln!("{}", format!("Could not load history: {}", error).red())
            }
        }
    }

    fn format_prompt(controller: &ChatController) -> String {
        match controller.current_session() {
            Some(session) => {
                let short: String = session.id.chars().take(8).collect();
                format!("[{}] >>> ", short.cyan())
            }
            None => format!("[{}] >>> ", "new".green()),
        }
    }

    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║          NexusChat Career Assistant - Welcome!               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Server: {}", config.api.base_url.cyan());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_transcript(messages: &[ChatMessage]) {
        for message in messages {
            if message.is_error() {
                println!("{}", message.content.red());
            } else if message.is_from_assistant {
                println!("{}\n", message.content);
            } else {
                println!("{} {}", ">>>".bold(), message.content);
            }
        }
        if !messages.is_empty() {
            println!();
        }
    }

    fn print_session_list(sessions: &[ConversationSession], current: Option<String>) {
        if sessions.is_empty() {
            println!("{}\n", "No conversations yet.".yellow());
            return;
        }
        for session in sessions {
            let marker = if current.as_deref() == Some(session.id.as_str()) {
                "*".green().to_string()
            } else {
                " ".to_string()
            };
            let short: String = session.id.chars().take(8).collect();
            println!(
                "{} {}  {}  {} ({} messages)",
                marker,
                short.cyan(),
                session.end_time.format("%Y-%m-%d %H:%M"),
                session.title,
                session.message_count
            );
        }
        println!();
    }

    /// Display the active conversation and connection state
    fn print_status_display(controller: &ChatController, config: &Config, history_pending: bool) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   NexusChat Session Status                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Server:            {}", config.api.base_url);
        match controller.current_session() {
            Some(session) => {
                println!("Conversation:      {} ({})", session.title.bold(), session.id)
            }
            None => println!("Conversation:      {}", "new".green()),
        }
        println!("Transcript Size:   {} messages", controller.messages().len());
        println!("Known Sessions:    {}", controller.sessions().len());
        if history_pending {
            println!("History:           {}", "loading".yellow());
        }
        if let Some(error) = controller.last_error() {
            println!("Last Error:        {}", error.red());
        }
        println!();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_finished_load_is_reported_once() {
            let handle = tokio::spawn(async { HistoryLoad::Unauthenticated });
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
            let mut slot = Some(handle);

            assert_eq!(
                take_finished_load(&mut slot).await,
                Some(HistoryLoad::Unauthenticated)
            );
            assert!(slot.is_none());
            assert_eq!(take_finished_load(&mut slot).await, None);
        }

        #[tokio::test]
        async fn test_running_load_is_left_in_place() {
            let mut slot = Some(tokio::spawn(async {
                std::future::pending::<HistoryLoad>().await
            }));

            assert_eq!(take_finished_load(&mut slot).await, None);
            let handle = slot.take().unwrap();
            assert!(!handle.is_finished());
            handle.abort();
        }
    }
}

// One-shot send handler
pub mod send {
    //! Send a single message outside the interactive loop.

    use super::*;
    use crate::controller::SendOutcome;
    use crate::error::NexusError;

    /// Send `message` as a new conversation and print the reply
    ///
    /// # Errors
    ///
    /// Returns error if the message is empty or the request fails, so the
    /// process exits non-zero.
    pub async fn run_send(config: Config, message: String) -> Result<()> {
        let controller = build_controller(&config)?;
        match controller.send_message(&message).await {
            SendOutcome::Delivered { reply } => {
                println!("{}", reply);
                Ok(())
            }
            SendOutcome::Failed { error } => Err(NexusError::Command(error).into()),
            SendOutcome::Rejected(reason) => {
                Err(NexusError::Command(format!("Message not sent: {:?}", reason)).into())
            }
            SendOutcome::Cancelled => Err(NexusError::Command("Request cancelled".to_string()).into()),
        }
    }
}

/// Auth command(s)
///
/// Stores the bearer token issued by the identity provider in the OS keyring
/// so later commands pick it up.
pub mod auth {
    use super::*;
    use crate::auth::{KeyringCredentialProvider, StoredCredential};
    use crate::cli::AuthCommand;
    use crate::error::NexusError;
    use chrono::{Duration, Utc};
    use colored::Colorize;

    /// Handle an `auth` subcommand
    ///
    /// # Errors
    ///
    /// Returns error if the keyring cannot be read or written, or the token
    /// or expiry is invalid.
    pub fn handle_auth(config: &Config, command: AuthCommand) -> Result<()> {
        let store = KeyringCredentialProvider::new(&config.auth.keyring_account);

        match command {
            AuthCommand::Login { token, expires_in } => {
                let credential = login_credential(&token, expires_in)?;
                store.save_token(&credential)?;
                println!("{}", "Token stored in the system keyring.".green());
            }
            AuthCommand::Logout => {
                store.delete_token()?;
                println!("{}", "Stored token removed.".green());
            }
            AuthCommand::Status => {
                if config.auth.token.is_some() {
                    println!("Using a token from configuration or NEXUSCHAT_TOKEN.");
                    return Ok(());
                }
                match store.load_token()? {
                    Some(credential) if credential.is_expired() => {
                        println!("{}", "Stored token has expired.".yellow())
                    }
                    Some(credential) => match credential.expires_at {
                        Some(at) => println!(
                            "Signed in; token expires {}",
                            at.format("%Y-%m-%d %H:%M UTC")
                        ),
                        None => println!("Signed in."),
                    },
                    None => println!("{}", "Not signed in.".yellow()),
                }
            }
        }

        Ok(())
    }

    /// Validate login arguments and build the credential to store
    fn login_credential(token: &str, expires_in: Option<i64>) -> Result<StoredCredential> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NexusError::Authentication("Token must not be empty".to_string()).into());
        }
        let expires_at = match expires_in {
            Some(seconds) if seconds <= 0 => {
                return Err(NexusError::Authentication(
                    "--expires-in must be a positive number of seconds".to_string(),
                )
                .into())
            }
            Some(seconds) => {
                let expires_at = Duration::try_seconds(seconds)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .ok_or_else(|| {
                        NexusError::Authentication(format!(
                            "--expires-in {} is out of range",
                            seconds
                        ))
                    })?;
                Some(expires_at)
            }
            None => None,
        };
        Ok(StoredCredential::new(token, expires_at))
    }

}
