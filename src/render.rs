//! Terminal rendering for the session client
//!
//! Formatting functions return strings so they can be tested; the `print_*`
//! wrappers write them to stdout. [`TerminalDisplay`] is the live view used
//! while an answer streams.

use std::io::{self, Write};

use colored::Colorize;

use crate::client::ResponseDisplay;
use crate::session::{ChatSession, Message, Role, SessionStore};

/// Marker prefixed to bot output
pub const BOT_MARKER: &str = "🤖 Bot:";

/// Marker prefixed to user messages
pub const USER_MARKER: &str = "👤 You:";

/// Shown while waiting for the first chunk
pub const TYPING_INDICATOR: &str = "Bot is typing...";

/// Marker next to the current session in the chat list
pub const CURRENT_MARKER: &str = "← Current";

/// Format one message of a transcript
pub fn format_message(message: &Message) -> String {
    let timestamp = format!("[{}]", message.timestamp()).dimmed();
    match message.role() {
        Role::User => format!(
            "{} {} {}",
            timestamp,
            USER_MARKER.blue().bold(),
            message.content()
        ),
        Role::Bot => format!(
            "{} {} {}",
            timestamp,
            BOT_MARKER.green().bold(),
            message.content()
        ),
    }
}

/// Format a session's full transcript, one message per line
pub fn format_transcript(session: &ChatSession) -> String {
    if session.is_empty() {
        return "No messages yet. Ask me anything!".dimmed().to_string();
    }
    session
        .messages()
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the numbered chat list with creation times and the current marker
pub fn format_chat_list(store: &SessionStore) -> String {
    let current = store.current_id();
    let mut lines = vec![format!("{}", "💬 Chat History".bold())];
    for (position, session) in store.sessions().enumerate() {
        let mut line = format!(
            "  {:>2}. {}  {}",
            position + 1,
            session.title(),
            format!("Created: {}", session.created_at()).dimmed()
        );
        if session.id() == current {
            line.push_str(&format!("  {}", CURRENT_MARKER.cyan().bold()));
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Format the header shown when entering or switching a session
pub fn format_header(session: &ChatSession) -> String {
    format!("{} {}", "Current Chat:".bold(), session.title())
}

/// Format the `/status` panel
pub fn format_status(store: &SessionStore, api_url: &str) -> String {
    let session = store.current();
    [
        format!("Relay Endpoint:    {}", api_url),
        format!("Sessions:          {}", store.len()),
        format!("Current Chat:      {}", session.title()),
        format!("Created:           {}", session.created_at()),
        format!("Conversation Size: {} messages", session.messages().len()),
    ]
    .join("\n")
}

pub fn print_welcome_banner(store: &SessionStore) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                ragchat - Streaming Chat Client               ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("{}", format_header(store.current()));
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

/// Format the current session's header followed by its transcript
pub fn format_session(store: &SessionStore) -> String {
    format!(
        "{}\n{}",
        format_header(store.current()),
        format_transcript(store.current())
    )
}

pub fn print_session(store: &SessionStore) {
    println!("\n{}\n", format_session(store));
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message.red());
}

/// Live view of a streaming answer on a terminal
///
/// Shows the typing indicator until the first chunk, then replaces it with
/// the bot marker and appends chunks as they arrive.
#[derive(Debug)]
pub struct TerminalDisplay<W: Write> {
    out: W,
    typing: bool,
    wrote_text: bool,
}

impl TerminalDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            typing: false,
            wrote_text: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

// Display output is best effort; a closed stdout must not abort the exchange.
impl<W: Write> ResponseDisplay for TerminalDisplay<W> {
    fn start(&mut self) {
        self.typing = true;
        self.wrote_text = false;
        let _ = write!(self.out, "{}", TYPING_INDICATOR.dimmed());
        let _ = self.out.flush();
    }

    fn update(&mut self, chunk: &str, _accumulated: &str) {
        if self.typing {
            let _ = write!(self.out, "\r\x1b[2K{} ", BOT_MARKER.green().bold());
            self.typing = false;
        }
        self.wrote_text = true;
        let _ = write!(self.out, "{}", chunk);
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        if self.typing {
            let _ = write!(self.out, "\r\x1b[2K");
            self.typing = false;
        }
        if self.wrote_text {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}
