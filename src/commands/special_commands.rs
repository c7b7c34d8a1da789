//! Special commands parser for the interactive chat client
//!
//! Special commands manage sessions instead of being sent to the relay:
//! - Start, list, switch, and delete chat sessions
//! - Reprint the current transcript
//! - View client status
//! - Display help information
//! - Exit the client
//!
//! Commands are prefixed with `/` and are case-insensitive. Session
//! positions are 1-based, matching the numbers shown by `/chats`.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new empty session and make it current
    NewChat,

    /// List sessions with creation time and the current marker
    ListChats,

    /// Make the session at this 1-based position current
    SwitchChat(usize),

    /// Delete the session at this 1-based position
    ///
    /// Refused when it is the only session.
    DeleteChat(usize),

    /// Reprint the current session's transcript
    History,

    /// Display relay endpoint and session counts
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive client
    Exit,

    /// Not a special command
    ///
    /// The input is sent to the relay as a query.
    None,
}

/// Parse user input into a special command
///
/// Returns [`SpecialCommand::None`] for anything that is not a command,
/// which the caller treats as a query.
///
/// # Errors
///
/// Returns [`CommandError`] for unknown `/` commands and for commands with
/// a missing or invalid argument.
///
/// # Examples
///
/// ```
/// use ragchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(parse_special_command("/switch 2").unwrap(), SpecialCommand::SwitchChat(2));
/// assert_eq!(parse_special_command("What is X?").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Anything not starting with "/" is a query (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();
    let extra = parts.next();

    let no_argument = |cmd: SpecialCommand| match arg {
        None => Ok(cmd),
        Some(arg) => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    };

    match command {
        "/new" => no_argument(SpecialCommand::NewChat),
        "/chats" | "/list" => no_argument(SpecialCommand::ListChats),
        "/history" => no_argument(SpecialCommand::History),
        "/status" => no_argument(SpecialCommand::ShowStatus),
        "/help" | "/?" => no_argument(SpecialCommand::Help),
        "exit" | "quit" | "/exit" | "/quit" => no_argument(SpecialCommand::Exit),

        "/switch" => parse_position(command, arg, extra).map(SpecialCommand::SwitchChat),
        "/delete" => parse_position(command, arg, extra).map(SpecialCommand::DeleteChat),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn parse_position(
    command: &str,
    arg: Option<&str>,
    extra: Option<&str>,
) -> Result<usize, CommandError> {
    let arg = arg.ok_or_else(|| CommandError::MissingArgument {
        command: command.to_string(),
        usage: format!("{} <number>  (see /chats)", command),
    })?;

    if let Some(extra) = extra {
        return Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: extra.to_string(),
        });
    }

    match arg.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Display help text for special commands
///
/// # Examples
///
/// ```
/// use ragchat::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new            - Start a new chat and switch to it
  /chats          - List chats (the current one is marked)
  /list           - Same as /chats
  /switch <n>     - Switch to chat number <n> from /chats
  /delete <n>     - Delete chat number <n> (the last chat cannot be deleted)

SESSION INFORMATION:
  /history        - Reprint the current chat
  /status         - Show relay endpoint and session counts
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  exit            - Exit the client
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the relay
  - Chats live in memory only and are lost on exit
"#
    );
}
