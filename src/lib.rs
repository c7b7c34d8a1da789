//! ragchat - streaming chat relay and terminal client library
//!
//! This library provides both tiers of a small chat application: a relay
//! service that forwards a query to a hosted inference model and streams the
//! generated text back, and a terminal client that keeps several in-memory
//! chat sessions and renders answers as they arrive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `providers`: Inference provider abstraction (AWS Bedrock, scripted)
//! - `relay`: Filtering provider events into text chunks and relaying them
//! - `server`: HTTP routes of the relay service
//! - `session`: In-memory chat sessions
//! - `client`: Streaming HTTP client and the submit operation
//! - `render`: Terminal output for the client
//! - `commands`: CLI command handlers and interactive special commands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragchat::providers::{ScriptedProvider, StreamEvent};
//! use ragchat::server::{router, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = ScriptedProvider::from_events(vec![StreamEvent::text("Hi")]);
//!     let app = router(Arc::new(AppState::new(Arc::new(provider), 32)));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod relay;
pub mod render;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use client::{submit, RelayClient, StreamFailure, SubmitOutcome};
pub use config::Config;
pub use error::{RagchatError, Result};
pub use session::{ChatSession, Message, Role, SessionId, SessionStore};
