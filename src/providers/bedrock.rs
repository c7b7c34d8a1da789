//! AWS Bedrock provider
//!
//! Opens a `ConverseStream` call with the query as the only user message and
//! maps Bedrock's event union onto [`StreamEvent`].

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::config::{Credentials, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ContentBlockDelta, ConversationRole, ConverseStreamOutput as BedrockEvent,
    InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::Client;

use super::{ContentDelta, EventStream, InferenceProvider, StreamEvent, GENERATION_PARAMS};
use crate::config::ProviderConfig;
use crate::error::{RagchatError, Result};

/// Bedrock `ConverseStream` provider
///
/// The SDK client is cheap to clone and safe to share across requests; the
/// provider holds no other state.
#[derive(Debug, Clone)]
pub struct BedrockProvider {
    client: Client,
    model_id: String,
}

impl BedrockProvider {
    /// Build a provider from static credentials, region, and model id
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any setting is missing.
    pub async fn new(config: &ProviderConfig) -> Result<Self> {
        let access_key = required(&config.access_key, "AWS_ACCESS_KEY")?;
        let secret_key = required(&config.secret_key, "AWS_SECRET_KEY")?;
        let region = required(&config.region, "AWS_REGION")?;
        let model_id = required(&config.model_id, "BEDROCK_MODEL_ID")?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "ragchat-config");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        tracing::info!(region = %region, model_id = %model_id, "Bedrock client configured");

        Ok(Self {
            client: Client::new(&sdk_config),
            model_id: model_id.to_string(),
        })
    }

    /// The model identifier requests are sent to
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RagchatError::Config(format!("{} is required", name)).into())
}

fn map_event(event: BedrockEvent) -> StreamEvent {
    match event {
        BedrockEvent::MessageStart(start) => StreamEvent::MessageStart {
            role: start.role().as_str().to_string(),
        },
        BedrockEvent::ContentBlockStart(start) => StreamEvent::ContentBlockStart {
            index: start.content_block_index(),
        },
        BedrockEvent::ContentBlockDelta(delta_event) => StreamEvent::ContentBlockDelta {
            index: delta_event.content_block_index(),
            delta: match delta_event.delta() {
                Some(ContentBlockDelta::Text(text)) => ContentDelta::Text(text.clone()),
                _ => ContentDelta::NonText,
            },
        },
        BedrockEvent::ContentBlockStop(stop) => StreamEvent::ContentBlockStop {
            index: stop.content_block_index(),
        },
        BedrockEvent::MessageStop(stop) => StreamEvent::MessageStop {
            stop_reason: stop.stop_reason().as_str().to_string(),
        },
        BedrockEvent::Metadata(metadata) => StreamEvent::Metadata {
            input_tokens: metadata.usage().map(|u| u.input_tokens()),
            output_tokens: metadata.usage().map(|u| u.output_tokens()),
        },
        _ => StreamEvent::Unknown,
    }
}

#[async_trait]
impl InferenceProvider for BedrockProvider {
    async fn converse_stream(&self, query: &str) -> Result<EventStream> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(query.to_string()))
            .build()
            .map_err(|e| RagchatError::Provider(format!("Invalid message: {}", e)))?;

        let inference_config = InferenceConfiguration::builder()
            .max_tokens(GENERATION_PARAMS.max_tokens)
            .temperature(GENERATION_PARAMS.temperature)
            .top_p(GENERATION_PARAMS.top_p)
            .build();

        let output = self
            .client
            .converse_stream()
            .model_id(&self.model_id)
            .messages(message)
            .inference_config(inference_config)
            .send()
            .await
            .map_err(|e| {
                RagchatError::Provider(format!(
                    "ConverseStream request failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        tracing::debug!(model_id = %self.model_id, "ConverseStream established");

        let events = futures::stream::unfold(Some(output.stream), |receiver| async move {
            let mut receiver = receiver?;
            match receiver.recv().await {
                Ok(Some(event)) => Some((Ok(map_event(event)), Some(receiver))),
                Ok(None) => None,
                Err(e) => Some((
                    Err(RagchatError::Provider(format!(
                        "ConverseStream interrupted: {}",
                        DisplayErrorContext(&e)
                    ))),
                    None,
                )),
            }
        });

        Ok(Box::pin(events))
    }

    fn name(&self) -> &'static str {
        "bedrock"
    }
}
