/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive streaming chat
- `history`: List, show and delete saved sessions
*/

use crate::config::Config;
use crate::error::Result;
use crate::storage::{MemorySessionStore, SessionStore, SledSessionStore};

// History management commands
pub mod history;

// Special commands parser for session management
pub mod special_commands;

/// Open the session store selected by configuration
///
/// Ephemeral chats use an in-memory store that is dropped on exit.
pub fn open_store(config: &Config, ephemeral: bool) -> Result<Box<dyn SessionStore>> {
    if ephemeral {
        tracing::info!("Using in-memory chat history");
        return Ok(Box::new(MemorySessionStore::new()));
    }

    let path = config.storage.resolve_path()?;
    tracing::info!("Using chat history at {}", path.display());
    Ok(Box::new(SledSessionStore::open(&path)?))
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the model client and session manager, then runs a
    //! readline-based loop. Replies are printed fragment by fragment from
    //! the manager's event channel while `send_message` runs.

    use super::*;
    use crate::commands::history::{print_sessions, print_transcript};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::prompts::SUGGESTED_PROMPTS;
    use crate::providers::create_client;
    use crate::session::{find_session_by_prefix, Role, SessionEvent, SessionManager};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;
    use tokio::sync::mpsc;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `provider_name` - Optional override for the configured provider
    /// * `session` - Optional id or id prefix of a session to resume
    /// * `ephemeral` - Keep history in memory only
    pub async fn run_chat(
        config: Config,
        provider_name: Option<String>,
        session: Option<String>,
        ephemeral: bool,
    ) -> Result<()> {
        let client = create_client(&config.provider, provider_name.as_deref())?;
        let store = open_store(&config, ephemeral)?;

        let mut manager = SessionManager::new(store, client)
            .with_empty_response_policy(config.chat.empty_response);
        let mut events = manager.subscribe();

        if let Some(prefix) = session {
            let id = find_session_by_prefix(manager.sessions(), &prefix)?.id.clone();
            manager.select_session(&id);
            tracing::info!("Resuming session {}", id);
        }

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner();
        match manager.active_session() {
            Some(active) => print_transcript(active),
            None => print_suggestions(),
        }

        loop {
            let prompt = format!("{} ", ">".green().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewChat => {
                            manager.start_new_chat();
                            println!("{}", "Started a new chat.".green());
                            print_suggestions();
                            continue;
                        }
                        SpecialCommand::ListSessions => {
                            print_sessions(&manager.summaries(), manager.active_session_id());
                            continue;
                        }
                        SpecialCommand::SelectSession(prefix) => {
                            match find_session_by_prefix(manager.sessions(), &prefix) {
                                Ok(found) => {
                                    let id = found.id.clone();
                                    manager.select_session(&id);
                                    if let Some(active) = manager.active_session() {
                                        print_transcript(active);
                                    }
                                }
                                Err(e) => eprintln!("{}", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::DeleteSession(prefix) => {
                            match find_session_by_prefix(manager.sessions(), &prefix) {
                                Ok(found) => {
                                    let id = found.id.clone();
                                    manager.delete_session(&id);
                                    println!("{}", format!("Deleted session {}", id).green());
                                }
                                Err(e) => eprintln!("{}", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::ShowSession => {
                            match manager.active_session() {
                                Some(active) => print_transcript(active),
                                None => println!("{}", "No active chat.".yellow()),
                            }
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                    }

                    rl.add_history_entry(trimmed)?;

                    let (_, rendered) = tokio::join!(
                        manager.send_message(trimmed, None),
                        render_reply(&mut events)
                    );
                    if let Err(e) = rendered {
                        tracing::warn!("Failed to render reply: {}", e);
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

        println!("Goodbye!");
        Ok(())
    }

    /// Returns the cursor to column 0 and erases the line
    const CLEAR_LINE: &str = "\r\x1b[K";

    /// Output produced for one session event
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum RenderStep {
        /// Show the thinking indicator
        Thinking,
        /// Write text to the terminal
        Write(String),
        /// The reply is complete; `clear` erases an indicator still showing
        Done { clear: bool },
        /// Nothing to show
        Skip,
    }

    /// Turns manager events for one send into terminal output
    #[derive(Debug, Default)]
    pub(crate) struct ReplyRenderer {
        started: bool,
        showing_indicator: bool,
        model_message_id: Option<String>,
        printed: usize,
    }

    impl ReplyRenderer {
        pub(crate) fn handle(&mut self, event: &SessionEvent) -> RenderStep {
            match event {
                SessionEvent::LoadingChanged(true) => {
                    self.started = true;
                    self.showing_indicator = true;
                    RenderStep::Thinking
                }
                SessionEvent::LoadingChanged(false) if self.started => RenderStep::Done {
                    clear: std::mem::take(&mut self.showing_indicator),
                },
                SessionEvent::MessageAppended { message, .. }
                    if self.started && message.role == Role::Model =>
                {
                    let separator = if self.model_message_id.is_some() {
                        "\n"
                    } else {
                        ""
                    };
                    self.model_message_id = Some(message.id.clone());
                    self.printed = message.text.len();
                    let clear = self.clear_indicator();
                    RenderStep::Write(format!("{}{}{}", clear, separator, message.text))
                }
                SessionEvent::MessageUpdated {
                    message_id, text, ..
                } if self.model_message_id.as_deref() == Some(message_id.as_str()) => {
                    let delta = text.get(self.printed..).unwrap_or_default().to_string();
                    self.printed = text.len();
                    RenderStep::Write(delta)
                }
                _ => RenderStep::Skip,
            }
        }

        fn clear_indicator(&mut self) -> &'static str {
            if std::mem::take(&mut self.showing_indicator) {
                CLEAR_LINE
            } else {
                ""
            }
        }
    }

    /// Print a reply as it streams in, returning once loading ends
    async fn render_reply(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Result<()> {
        let mut renderer = ReplyRenderer::default();
        let mut stdout = std::io::stdout();

        while let Some(event) = events.recv().await {
            match renderer.handle(&event) {
                RenderStep::Thinking => {
                    print!("{}", "Thinking...".dimmed());
                    stdout.flush()?;
                }
                RenderStep::Write(text) => {
                    print!("{}", text);
                    stdout.flush()?;
                }
                RenderStep::Done { clear } => {
                    if clear {
                        print!("{}", CLEAR_LINE);
                    } else {
                        println!("\n");
                    }
                    stdout.flush()?;
                    break;
                }
                RenderStep::Skip => {}
            }
        }

        Ok(())
    }

    fn print_welcome_banner() {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                Healthcare Assistant - Welcome!               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "{}",
            "General health information only. Not a substitute for professional medical advice."
                .yellow()
        );
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_suggestions() {
        println!("{}", "Try asking:".bold());
        for prompt in SUGGESTED_PROMPTS {
            println!("  • {}", prompt.cyan());
        }
        println!();
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChatSession;
    use crate::test_utils::{temp_dir, test_config};

    #[test]
    fn test_open_store_ephemeral_starts_empty() {
        let store = open_store(&Config::default(), true).expect("memory store");
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_open_store_uses_configured_path() {
        let dir = temp_dir();
        let config = test_config(&dir);

        let store = open_store(&config, false).expect("sled store");
        store.save(&[ChatSession::new()]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
