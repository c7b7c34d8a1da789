//! Error types for ragchat
//!
//! This module defines the error types shared by the relay service and the
//! session client, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for ragchat operations
///
/// Covers configuration loading, inference provider calls, the streaming
/// relay, session bookkeeping, and interactive command parsing.
#[derive(Error, Debug)]
pub enum RagchatError {
    /// Configuration-related errors (missing or invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inference provider errors (request rejected, stream failure, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Relay errors raised while forwarding a stream downstream
    #[error("Relay error: {0}")]
    Relay(String),

    /// Session bookkeeping errors (unknown session identifiers)
    #[error("Session error: {0}")]
    Session(String),

    /// Interactive command errors
    #[error("Command error: {0}")]
    Command(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ragchat operations
///
/// Uses `anyhow::Error` as the error type, allowing rich error context and
/// easy propagation; concrete failures are raised as [`RagchatError`].
pub type Result<T> = anyhow::Result<T>;
