//! Inference provider abstraction for ragchat
//!
//! The relay never talks to a vendor SDK directly. It asks an
//! [`InferenceProvider`] to open a streaming conversation and receives a
//! stream of [`StreamEvent`]s, the provider-neutral mirror of the events a
//! hosted model emits while generating.
//!
//! - [`bedrock::BedrockProvider`] -- AWS Bedrock `ConverseStream`
//! - [`scripted::ScriptedProvider`] -- in-process provider replaying a fixed
//!   event script (used by tests)

pub mod bedrock;
pub mod scripted;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::config::ProviderConfig;
use crate::error::{RagchatError, Result};

pub use bedrock::BedrockProvider;
pub use scripted::ScriptedProvider;

/// Fixed generation parameters applied to every request
///
/// These are deliberately not configurable per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of output tokens
    pub max_tokens: i32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
}

/// The generation parameters used by the relay
pub const GENERATION_PARAMS: GenerationParams = GenerationParams {
    max_tokens: 400,
    temperature: 0.7,
    top_p: 0.9,
};

/// Payload of a content delta event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDelta {
    /// A fragment of generated text (may be empty)
    Text(String),
    /// Tool-use input, reasoning traces, or anything else that is not text
    NonText,
}

/// One event of a provider's streaming response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The model started a message
    MessageStart { role: String },
    /// A content block opened
    ContentBlockStart { index: i32 },
    /// Incremental content for an open block
    ContentBlockDelta { index: i32, delta: ContentDelta },
    /// A content block closed
    ContentBlockStop { index: i32 },
    /// The model finished its message
    MessageStop { stop_reason: String },
    /// Usage metadata, sent after the message stops
    Metadata {
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
    },
    /// An event kind this crate does not model
    Unknown,
}

impl StreamEvent {
    /// Convenience constructor for a text delta on block 0
    pub fn text(text: impl Into<String>) -> Self {
        Self::ContentBlockDelta {
            index: 0,
            delta: ContentDelta::Text(text.into()),
        }
    }

    /// The text payload if this is a content delta carrying text
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            Self::ContentBlockDelta {
                delta: ContentDelta::Text(text),
                ..
            } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// A provider event stream
///
/// Items are errors when the upstream stream fails mid-flight; the stream
/// ends after yielding such an error.
pub type EventStream =
    Pin<Box<dyn Stream<Item = std::result::Result<StreamEvent, RagchatError>> + Send>>;

/// Abstraction over hosted inference services
#[async_trait]
pub trait InferenceProvider: Send + Sync + std::fmt::Debug {
    /// Open a streaming conversation with `query` as the sole user message
    ///
    /// # Errors
    ///
    /// Returns an error when the call fails before any event is produced
    /// (bad credentials, unknown model, throttling, network failure).
    async fn converse_stream(&self, query: &str) -> Result<EventStream>;

    /// Human-readable provider name for logs
    fn name(&self) -> &'static str;
}

/// Create the configured provider
///
/// # Errors
///
/// Returns a configuration error if required provider settings are missing.
pub async fn create_provider(config: &ProviderConfig) -> Result<Box<dyn InferenceProvider>> {
    Ok(Box::new(BedrockProvider::new(config).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_delta_extracts_text_only() {
        assert_eq!(StreamEvent::text("Hi").text_delta(), Some("Hi"));
        assert_eq!(StreamEvent::text("").text_delta(), Some(""));

        let non_text = StreamEvent::ContentBlockDelta {
            index: 1,
            delta: ContentDelta::NonText,
        };
        assert_eq!(non_text.text_delta(), None);
        assert_eq!(
            StreamEvent::MessageStart {
                role: "assistant".to_string()
            }
            .text_delta(),
            None
        );
        assert_eq!(StreamEvent::Unknown.text_delta(), None);
    }

    #[test]
    fn test_generation_params_are_fixed() {
        assert_eq!(GENERATION_PARAMS.max_tokens, 400);
        assert!((GENERATION_PARAMS.temperature - 0.7).abs() < f32::EPSILON);
        assert!((GENERATION_PARAMS.top_p - 0.9).abs() < f32::EPSILON);
    }
}
