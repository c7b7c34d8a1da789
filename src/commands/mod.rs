/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `serve` - Run the relay service
- `chat`  - Interactive multi-session chat client
- `ask`   - Send a single query and stream the answer to stdout
*/

use crate::client::{submit, RelayClient, SubmitOutcome};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::{RagchatError, Result};
use crate::render;
use crate::session::SessionStore;
use std::time::Duration;

// Special commands parser for session management
pub mod special_commands;

/// Build the relay client from validated client settings
fn relay_client(config: &Config) -> Result<RelayClient> {
    let url = config
        .client
        .api_url
        .clone()
        .ok_or_else(|| RagchatError::Config("API_URL is required".to_string()))?;
    RelayClient::new(url, Duration::from_secs(config.client.timeout_seconds))
}

// Relay service command handler
pub mod serve {
    //! Relay service handler.

    use super::*;

    /// Run the relay service until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be configured or the listener
    /// cannot be bound.
    pub async fn run_serve(config: Config) -> Result<()> {
        tracing::info!(
            bind_address = %config.server.bind_address,
            "Starting relay service"
        );
        crate::server::serve(&config).await
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat client handler.
    //!
    //! Runs a readline loop over an in-memory [`SessionStore`]. Lines that
    //! are not special commands are submitted to the relay and the answer is
    //! streamed to the terminal.

    use super::*;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// What the REPL does after handling a special command
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CommandFlow {
        Continue,
        Exit,
    }

    /// Start the interactive chat client
    ///
    /// # Errors
    ///
    /// Returns an error if the relay client or the line editor cannot be
    /// created. Relay failures during the session are recorded as bot
    /// messages instead.
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat client");

        let client = relay_client(&config)?;
        let mut store = SessionStore::new();
        let mut rl = DefaultEditor::new()?;

        render::print_welcome_banner(&store);

        loop {
            let prompt = format!("{} ", "You>".blue().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    match parse_special_command(&line) {
                        Ok(SpecialCommand::None) => {}
                        Ok(command) => {
                            if apply_command(&mut store, command, client.url())
                                == CommandFlow::Exit
                            {
                                break;
                            }
                            continue;
                        }
                        Err(e) => {
                            render::print_error(&e.to_string());
                            continue;
                        }
                    }

                    rl.add_history_entry(line.trim())?;

                    let mut display = render::TerminalDisplay::stdout();
                    let outcome = submit(&mut store, &client, &line, &mut display).await?;
                    if let Some(SubmitOutcome::Failed(failure)) = &outcome {
                        tracing::debug!(error = %failure, "Exchange failed");
                    }
                    if outcome.is_some() {
                        render::print_session(&store);
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

    /// Apply a special command to the session store and print its output
    pub fn apply_command(
        store: &mut SessionStore,
        command: SpecialCommand,
        api_url: &str,
    ) -> CommandFlow {
        match command {
            SpecialCommand::NewChat => {
                store.create_session();
                render::print_session(store);
            }
            SpecialCommand::ListChats => {
                println!("\n{}\n", render::format_chat_list(store));
            }
            SpecialCommand::SwitchChat(position) => match store.id_at(position) {
                Some(id) => match store.switch_session(id) {
                    Ok(()) => render::print_session(store),
                    Err(e) => render::print_error(&e.to_string()),
                },
                None => render::print_error(&no_such_chat(position, store.len())),
            },
            SpecialCommand::DeleteChat(position) => match store.id_at(position) {
                Some(id) => match store.delete_session(id) {
                    Ok(true) => {
                        println!("Deleted chat {}\n", position);
                        render::print_session(store);
                    }
                    Ok(false) => render::print_error("Cannot delete the only chat"),
                    Err(e) => render::print_error(&e.to_string()),
                },
                None => render::print_error(&no_such_chat(position, store.len())),
            },
            SpecialCommand::History => render::print_session(store),
            SpecialCommand::ShowStatus => {
                println!("\n{}\n", render::format_status(store, api_url));
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => return CommandFlow::Exit,
            SpecialCommand::None => {}
        }
        CommandFlow::Continue
    }

    fn no_such_chat(position: usize, count: usize) -> String {
        format!("No chat number {} (there are {}; see /chats)", position, count)
    }
}

// Ask command handler
pub mod ask {
    //! One-shot query handler.

    use super::*;

    /// Send `query` once and stream the answer to stdout
    ///
    /// Blank queries are ignored.
    ///
    /// # Errors
    ///
    /// Returns a relay error carrying the failure message if the exchange
    /// fails, so the process exits non-zero.
    pub async fn run_ask(config: Config, query: String) -> Result<()> {
        if query.trim().is_empty() {
            tracing::debug!("Ignoring blank query");
            return Ok(());
        }

        let client = relay_client(&config)?;
        let mut display = render::TerminalDisplay::stdout();
        match client.stream_query(&query, &mut display).await {
            Ok(answer) => {
                tracing::debug!(bytes = answer.len(), "Answer received");
                Ok(())
            }
            Err(failure) => Err(RagchatError::Relay(failure.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::chat::{apply_command, CommandFlow};
    use super::*;
    use crate::session::Role;

    const URL: &str = "http://localhost:8000/api/chat/stream";

    #[test]
    fn test_new_chat_becomes_current() {
        let mut store = SessionStore::new();
        let first = store.current_id();

        let flow = apply_command(&mut store, SpecialCommand::NewChat, URL);

        assert_eq!(flow, CommandFlow::Continue);
        assert_eq!(store.len(), 2);
        assert_ne!(store.current_id(), first);
    }

    #[test]
    fn test_switch_by_position() {
        let mut store = SessionStore::new();
        let first = store.current_id();
        store.create_session();

        apply_command(&mut store, SpecialCommand::SwitchChat(1), URL);
        assert_eq!(store.current_id(), first);

        apply_command(&mut store, SpecialCommand::SwitchChat(5), URL);
        assert_eq!(store.current_id(), first);
    }

    #[test]
    fn test_delete_only_chat_is_refused() {
        let mut store = SessionStore::new();
        let id = store.current_id();
        store.append_message(id, Role::User, "hello").unwrap();

        apply_command(&mut store, SpecialCommand::DeleteChat(1), URL);

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_id(), id);
        assert_eq!(store.current().messages().len(), 1);
    }

    #[test]
    fn test_delete_current_chat_moves_to_first() {
        let mut store = SessionStore::new();
        let first = store.current_id();
        store.create_session();

        apply_command(&mut store, SpecialCommand::DeleteChat(2), URL);

        assert_eq!(store.len(), 1);
        assert_eq!(store.current_id(), first);
    }

    #[test]
    fn test_exit_stops_loop() {
        let mut store = SessionStore::new();
        assert_eq!(
            apply_command(&mut store, SpecialCommand::Exit, URL),
            CommandFlow::Exit
        );
        assert_eq!(
            apply_command(&mut store, SpecialCommand::ListChats, URL),
            CommandFlow::Continue
        );
    }

    #[test]
    fn test_relay_client_requires_url() {
        let config = Config::default();
        assert!(relay_client(&config).is_err());
    }

    #[tokio::test]
    async fn test_ask_ignores_blank_query() {
        let config = Config::default();
        assert!(ask::run_ask(config, "   ".to_string()).await.is_ok());
    }
}
