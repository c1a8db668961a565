//! Special commands parser for interactive chat mode
//!
//! Special commands manage sessions from inside the chat prompt instead of
//! being sent to the model. They are prefixed with `/`; the command word is
//! case-insensitive, arguments are taken verbatim.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command does not take an argument but one was given
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Deselect the current session; the next message starts a new one
    NewChat,

    /// List saved sessions
    ListSessions,

    /// Switch to a session by id or unique id prefix
    SelectSession(String),

    /// Delete a session by id or unique id prefix
    DeleteSession(String),

    /// Reprint the active session's transcript
    ShowSession,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input to the model
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError`] when the input starts with `/` but is not a
/// valid command, or its argument is missing or unexpected.
///
/// # Examples
///
/// ```
/// use healthchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/select 3fa8").unwrap(),
///     SpecialCommand::SelectSession("3fa8".to_string())
/// );
/// assert_eq!(
///     parse_special_command("How much water should I drink?").unwrap(),
///     SpecialCommand::None
/// );
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), Some(rest.trim())),
        None => (lower.clone(), None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    match command.as_str() {
        "/new" => no_arg("/new", arg, SpecialCommand::NewChat),
        "/sessions" | "/list" => no_arg(&command, arg, SpecialCommand::ListSessions),
        "/show" => no_arg("/show", arg, SpecialCommand::ShowSession),
        "/help" | "/?" => no_arg(&command, arg, SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        "/select" => arg
            .map(|id| SpecialCommand::SelectSession(id.to_string()))
            .ok_or_else(|| CommandError::MissingArgument {
                command: "/select".to_string(),
                usage: "/select <session-id>".to_string(),
            }),
        "/delete" => arg
            .map(|id| SpecialCommand::DeleteSession(id.to_string()))
            .ok_or_else(|| CommandError::MissingArgument {
                command: "/delete".to_string(),
                usage: "/delete <session-id>".to_string(),
            }),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn no_arg(
    command: &str,
    arg: Option<&str>,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    match arg {
        Some(arg) => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
        None => Ok(parsed),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new              - Start a new chat (created on your next message)
  /sessions         - List saved chats
  /list             - Same as /sessions
  /select <id>      - Switch to a chat by id or unique id prefix
  /delete <id>      - Delete a chat by id or unique id prefix
  /show             - Reprint the current chat

SESSION CONTROL:
  /help             - Show this help message
  /?                - Same as /help
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Answers are general information, not medical advice
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new() {
        assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
    }

    #[test]
    fn test_parse_sessions_and_alias() {
        assert_eq!(
            parse_special_command("/sessions").unwrap(),
            SpecialCommand::ListSessions
        );
        assert_eq!(
            parse_special_command("/list").unwrap(),
            SpecialCommand::ListSessions
        );
    }

    #[test]
    fn test_parse_select_keeps_argument_case() {
        assert_eq!(
            parse_special_command("/SELECT AbC-1").unwrap(),
            SpecialCommand::SelectSession("AbC-1".to_string())
        );
    }

    #[test]
    fn test_parse_delete() {
        assert_eq!(
            parse_special_command("/delete  3fa8  ").unwrap(),
            SpecialCommand::DeleteSession("3fa8".to_string())
        );
    }

    #[test]
    fn test_parse_select_without_id_returns_error() {
        let err = parse_special_command("/select").unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { .. }));
        assert!(err.to_string().contains("/select <session-id>"));
    }

    #[test]
    fn test_parse_delete_without_id_returns_error() {
        assert!(matches!(
            parse_special_command("/delete   ").unwrap_err(),
            CommandError::MissingArgument { .. }
        ));
    }

    #[test]
    fn test_parse_new_with_argument_returns_error() {
        assert_eq!(
            parse_special_command("/new please").unwrap_err(),
            CommandError::UnsupportedArgument {
                command: "/new".to_string(),
                arg: "please".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_help_variants() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "/exit", "/quit", "EXIT"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_show() {
        assert_eq!(
            parse_special_command("/show").unwrap(),
            SpecialCommand::ShowSession
        );
    }

    #[test]
    fn test_parse_regular_text_returns_none() {
        assert_eq!(
            parse_special_command("What helps with a headache?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("").unwrap(), SpecialCommand::None);
        assert_eq!(parse_special_command("   ").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_parse_unknown_command_returns_error() {
        let err = parse_special_command("/foo bar").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/foo bar".to_string()));
        assert!(err.to_string().contains("/help"));
    }
}
