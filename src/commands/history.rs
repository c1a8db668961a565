use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::session::{find_session_by_prefix, ChatSession, Role, SessionSummary};
use crate::storage::{SessionStore, SledSessionStore};
use colored::Colorize;
use prettytable::{format, Table};

/// Characters of the id shown in listings
const SHORT_ID_LEN: usize = 8;

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let path = config.storage.resolve_path()?;
    tracing::debug!("Opening chat history at {}", path.display());
    let store = SledSessionStore::open(&path)?;

    match command {
        HistoryCommand::List => {
            let summaries: Vec<SessionSummary> =
                store.load()?.iter().map(ChatSession::summary).collect();
            print_sessions(&summaries, None);
            if !summaries.is_empty() {
                println!(
                    "Use {} to resume a session.",
                    "healthchat chat --session <ID>".cyan()
                );
                println!();
            }
        }
        HistoryCommand::Show { id } => {
            let sessions = store.load()?;
            let session = find_session_by_prefix(&sessions, &id)?;
            print_transcript(session);
        }
        HistoryCommand::Delete { id } => {
            let mut sessions = store.load()?;
            let target = find_session_by_prefix(&sessions, &id)?.id.clone();
            sessions.retain(|s| s.id != target);
            store.save(&sessions)?;
            tracing::info!("Deleted session {}", target);
            println!("{}", format!("Deleted session {}", target).green());
        }
        HistoryCommand::Clear => {
            store.clear()?;
            tracing::info!("Cleared chat history");
            println!("{}", "Chat history cleared.".green());
        }
    }

    Ok(())
}

/// Print a table of sessions, marking the active one
pub fn print_sessions(sessions: &[SessionSummary], active_id: Option<&str>) {
    if sessions.is_empty() {
        println!("{}", "No chat history found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Created".bold()
    ]);

    for session in sessions {
        let id_short: String = session.id.chars().take(SHORT_ID_LEN).collect();
        let id_cell = if active_id == Some(session.id.as_str()) {
            format!("* {}", id_short).green()
        } else {
            id_short.cyan()
        };
        let created = session
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![
            id_cell,
            session.title,
            session.message_count,
            created
        ]);
    }

    println!("\nChat History:");
    table.printstd();
    println!();
}

/// Print every message of a session
pub fn print_transcript(session: &ChatSession) {
    println!("\n{} {}", "Session:".bold(), session.title);
    println!("{}\n", session.id.dimmed());

    if session.messages.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }

    for message in &session.messages {
        let label = match message.role {
            Role::User => "You".cyan().bold(),
            Role::Model => "Assistant".green().bold(),
        };
        let time = message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M");
        println!("{} {}", label, time.to_string().dimmed());
        println!("{}\n", message.text);
    }
}
