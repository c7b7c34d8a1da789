//! In-process scripted provider
//!
//! [`ScriptedProvider`] replays a fixed list of [`ScriptStep`]s for every
//! call, replacing the hosted model in unit and integration tests. It can
//! also fail before streaming, fail mid-stream, or hang open so tests can
//! observe disconnect handling.
//!
//! ```
//! use ragchat::providers::{InferenceProvider, ScriptedProvider, StreamEvent};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = ScriptedProvider::from_events(vec![StreamEvent::text("Hi")]);
//! let mut events = provider.converse_stream("hello").await.unwrap();
//! assert_eq!(events.next().await.unwrap().unwrap(), StreamEvent::text("Hi"));
//! assert_eq!(provider.queries(), vec!["hello".to_string()]);
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{EventStream, InferenceProvider, StreamEvent};
use crate::error::{RagchatError, Result};

/// One step of a scripted response
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Yield this event
    Event(StreamEvent),
    /// Yield a mid-stream failure and end the stream
    Fail(String),
    /// Never yield again; the stream stays open until dropped
    Hang,
}

/// Provider that replays a script instead of calling a hosted model
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    steps: Vec<ScriptStep>,
    reject_with: Option<String>,
    queries: Arc<Mutex<Vec<String>>>,
    dropped: Arc<AtomicBool>,
}

impl ScriptedProvider {
    /// Script consisting of plain events
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        Self::from_steps(events.into_iter().map(ScriptStep::Event).collect())
    }

    /// Script with failures or hangs interleaved
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Provider whose call fails before any event is produced
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            reject_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// Queries received so far, in call order
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    /// Whether a stream handed out by this provider has been dropped
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Sets the shared flag when the owning stream is dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    async fn converse_stream(&self, query: &str) -> Result<EventStream> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        if let Some(message) = &self.reject_with {
            return Err(RagchatError::Provider(message.clone()).into());
        }

        let state = (
            self.steps.clone().into_iter(),
            DropFlag(Arc::clone(&self.dropped)),
            false,
        );
        let events = futures::stream::unfold(state, |(mut steps, flag, finished)| async move {
            if finished {
                return None;
            }
            match steps.next()? {
                ScriptStep::Event(event) => Some((Ok(event), (steps, flag, false))),
                ScriptStep::Fail(message) => {
                    Some((Err(RagchatError::Provider(message)), (steps, flag, true)))
                }
                ScriptStep::Hang => {
                    futures::future::pending::<()>().await;
                    None
                }
            }
        });

        Ok(Box::pin(events))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
