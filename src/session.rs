//! In-memory chat sessions
//!
//! [`SessionStore`] owns every [`ChatSession`] of one client process plus the
//! pointer to the current one. All mutation goes through its API so the
//! invariants hold at every step:
//!
//! - message histories are append-only
//! - at least one session always exists
//! - the current id always names an existing session
//! - a session title is derived once, from the first user message

use chrono::Local;
use std::fmt;
use uuid::Uuid;

use crate::error::{RagchatError, Result};

/// Title shown for a session that has no messages yet
pub const DEFAULT_TITLE: &str = "New Chat";

/// Titles longer than this many characters are truncated
pub const TITLE_MAX_CHARS: usize = 50;

/// Opaque unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// One message of a session's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: String,
}

impl Message {
    fn now(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Local wall-clock time the message was created, formatted `HH:MM`
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// One independent conversation
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: SessionId,
    title: Option<String>,
    created_at: String,
    messages: Vec<Message>,
}

impl ChatSession {
    fn new() -> Self {
        Self {
            id: SessionId::new(),
            title: None,
            created_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display title; [`DEFAULT_TITLE`] until the first user message
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Derive a session title from the first user message
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn derive_title(first_message: &str) -> String {
    if first_message.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = first_message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        first_message.to_string()
    }
}

/// Owner of all sessions and the current-session pointer
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    current: SessionId,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store holding one empty, current session
    pub fn new() -> Self {
        let session = ChatSession::new();
        let current = session.id;
        Self {
            sessions: vec![session],
            current,
        }
    }

    /// Create a new empty session and make it current
    pub fn create_session(&mut self) -> SessionId {
        let session = ChatSession::new();
        let id = session.id;
        self.sessions.push(session);
        self.current = id;
        tracing::debug!(session_id = %id, "Created chat session");
        id
    }

    /// Make `id` the current session
    ///
    /// # Errors
    ///
    /// Returns a session error if `id` does not exist.
    pub fn switch_session(&mut self, id: SessionId) -> Result<()> {
        self.get(id)?;
        self.current = id;
        Ok(())
    }

    /// Delete a session
    ///
    /// Returns `Ok(false)` without changing anything when `id` is the only
    /// session. When the current session is deleted, the first remaining
    /// session becomes current.
    ///
    /// # Errors
    ///
    /// Returns a session error if `id` does not exist.
    pub fn delete_session(&mut self, id: SessionId) -> Result<bool> {
        let position = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| unknown_session(id))?;

        if self.sessions.len() == 1 {
            tracing::debug!(session_id = %id, "Refusing to delete the only session");
            return Ok(false);
        }

        self.sessions.remove(position);
        if self.current == id {
            self.current = self.sessions[0].id;
        }
        tracing::debug!(session_id = %id, "Deleted chat session");
        Ok(true)
    }

    /// Append a message to a session
    ///
    /// When this is the session's first message and it comes from the user,
    /// the session title is derived from it.
    ///
    /// # Errors
    ///
    /// Returns a session error if `id` does not exist.
    pub fn append_message(
        &mut self,
        id: SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Result<&Message> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| unknown_session(id))?;

        session.messages.push(Message::now(role, content.into()));

        if session.messages.len() == 1 && role == Role::User && session.title.is_none() {
            session.title = Some(derive_title(&session.messages[0].content));
        }

        Ok(&session.messages[session.messages.len() - 1])
    }

    /// Look up a session by id
    ///
    /// # Errors
    ///
    /// Returns a session error if `id` does not exist.
    pub fn get(&self, id: SessionId) -> Result<&ChatSession> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| unknown_session(id).into())
    }

    pub fn current_id(&self) -> SessionId {
        self.current
    }

    pub fn current(&self) -> &ChatSession {
        self.sessions
            .iter()
            .find(|s| s.id == self.current)
            .unwrap_or(&self.sessions[0])
    }

    /// Sessions in creation order
    pub fn sessions(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.iter()
    }

    /// Id of the session at a 1-based position in creation order
    pub fn id_at(&self, position: usize) -> Option<SessionId> {
        position
            .checked_sub(1)
            .and_then(|i| self.sessions.get(i))
            .map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn unknown_session(id: SessionId) -> RagchatError {
    RagchatError::Session(format!("unknown session {}", id))
}
