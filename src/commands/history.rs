use crate::cli::HistoryCommand;
use crate::commands::build_controller;
use crate::config::Config;
use crate::controller::{ChatController, HistoryLoad};
use crate::error::{NexusError, Result};
use crate::session::ConversationSession;
use colored::Colorize;
use prettytable::{format, Table};

/// Width at which titles are cut in the table view
const TABLE_TITLE_CHARS: usize = 40;

/// Handle history commands
pub async fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let controller = build_controller(config)?;
    load(&controller).await?;

    match command {
        HistoryCommand::List { json } => {
            print_sessions(&controller.sessions(), json, "No conversation history found.")?;
        }
        HistoryCommand::Search { query, json } => {
            let found = controller.filter_sessions(&query);
            print_sessions(
                &found,
                json,
                &format!("No conversations match '{}'.", query),
            )?;
        }
        HistoryCommand::Show { id } => {
            let session_id = controller
                .find_session_id(&id)
                .ok_or_else(|| NexusError::Command(format!("No conversation matches '{}'", id)))?;
            controller.select_session(&session_id);
            if let Some(session) = controller.current_session() {
                print_transcript(&session);
            }
        }
    }

    Ok(())
}

/// Fetch history, turning anything but a successful load into an error
async fn load(controller: &ChatController) -> Result<()> {
    match controller.load_history().await {
        HistoryLoad::Loaded { .. } => Ok(()),
        HistoryLoad::Unauthenticated => Err(NexusError::Authentication(
            "History requires a signed-in user; run 'nexuschat auth login'".to_string(),
        )
        .into()),
        HistoryLoad::Failed(error) => Err(NexusError::Command(error).into()),
        // Nothing else touches this controller
        HistoryLoad::Stale => Err(NexusError::Command("History changed while loading".to_string()).into()),
    }
}

fn print_sessions(sessions: &[ConversationSession], json: bool, empty_message: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("{}", empty_message.yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Active".bold()
    ]);

    for session in sessions {
        let id_short: String = session.id.chars().take(8).collect();
        let title = crate::session::truncate_title(&session.title, TABLE_TITLE_CHARS);
        let updated = session.end_time.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(prettytable::row![
            id_short.cyan(),
            title,
            session.message_count,
            updated
        ]);
    }

    println!("\nConversation History:");
    table.printstd();
    println!();
    println!(
        "Use {} to resume a conversation.",
        "nexuschat chat --resume <ID>".cyan()
    );
    println!();
    Ok(())
}

fn print_transcript(session: &ConversationSession) {
    println!("\n{}", session.title.bold());
    println!(
        "{}\n",
        format!(
            "{}  {} .. {}",
            session.id,
            session.start_time.format("%Y-%m-%d %H:%M"),
            session.end_time.format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
    for message in &session.messages {
        if message.is_from_assistant {
            println!("{} {}\n", "assistant:".green().bold(), message.content);
        } else {
            println!("{} {}", "you:".cyan().bold(), message.content);
        }
    }
}
