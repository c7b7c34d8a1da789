//! Session client side of the relay protocol
//!
//! [`RelayClient`] posts one query and reads the streamed answer chunk by
//! chunk, feeding a [`ResponseDisplay`] as text arrives. [`submit`] wraps
//! one full exchange around a [`SessionStore`]: it records the user
//! message, streams the answer, and records either the answer or the
//! failure as the bot message.

pub mod decode;

use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::error::Result;
use crate::server::ChatRequest;
use crate::session::{Role, SessionStore};

pub use decode::Utf8ChunkDecoder;

/// Default ceiling for connecting and for each wait on the next chunk
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a streaming exchange did not complete
///
/// `Display` is exactly the text recorded as the bot message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamFailure {
    /// The relay could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connecting or waiting for the next chunk took too long
    #[error("Request timed out. Please try again.")]
    Timeout,

    /// Anything else during the exchange
    #[error("An error occurred: {0}")]
    Other(String),
}

/// Live view of a response while it streams
pub trait ResponseDisplay {
    /// The request is about to be sent; chunks may follow
    fn start(&mut self) {}

    /// A new chunk arrived; `accumulated` includes it
    fn update(&mut self, chunk: &str, accumulated: &str);

    /// The stream ended, normally or not
    fn finish(&mut self) {}
}

/// Display that discards every update
#[derive(Debug, Default)]
pub struct NullDisplay;

impl ResponseDisplay for NullDisplay {
    fn update(&mut self, _chunk: &str, _accumulated: &str) {}
}

/// HTTP client for `POST /api/chat/stream`
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RelayClient {
    /// Create a client for the relay endpoint at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `query` and stream the answer into `display`
    ///
    /// `display` is started before the request is sent and finished on every
    /// outcome, so a typing indicator covers connecting and upstream setup.
    /// Returns the full accumulated text on clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamFailure`] describing why the exchange failed. Text
    /// already shown on `display` is not part of the error.
    pub async fn stream_query(
        &self,
        query: &str,
        display: &mut dyn ResponseDisplay,
    ) -> std::result::Result<String, StreamFailure> {
        display.start();
        let result = self.exchange(query, display).await;
        display.finish();
        result
    }

    async fn exchange(
        &self,
        query: &str,
        display: &mut dyn ResponseDisplay,
    ) -> std::result::Result<String, StreamFailure> {
        let request = self
            .http
            .post(&self.url)
            .json(&ChatRequest {
                query: query.to_string(),
            })
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => return Err(StreamFailure::Timeout),
            Ok(Err(e)) if e.is_timeout() => return Err(StreamFailure::Timeout),
            Ok(Err(e)) => return Err(StreamFailure::Connection(describe(&e))),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            let detail = match tokio::time::timeout(self.timeout, response.text()).await {
                Ok(Ok(body)) if !body.trim().is_empty() => {
                    format!("relay returned {}: {}", status, body.trim())
                }
                _ => format!("relay returned {}", status),
            };
            return Err(StreamFailure::Other(detail));
        }

        tracing::debug!(url = %self.url, "Relay stream opened");
        self.read_body(response, display).await
    }

    async fn read_body(
        &self,
        response: reqwest::Response,
        display: &mut dyn ResponseDisplay,
    ) -> std::result::Result<String, StreamFailure> {
        let mut chunks = response.bytes_stream();
        let mut decoder = Utf8ChunkDecoder::new();
        let mut accumulated = String::new();

        loop {
            let next = tokio::time::timeout(self.timeout, chunks.next())
                .await
                .map_err(|_| StreamFailure::Timeout)?;

            let text = match next {
                Some(Ok(bytes)) => decoder.decode(&bytes),
                Some(Err(e)) if e.is_timeout() => return Err(StreamFailure::Timeout),
                Some(Err(e)) => return Err(StreamFailure::Other(describe(&e))),
                None => break,
            };

            if !text.is_empty() {
                accumulated.push_str(&text);
                display.update(&text, &accumulated);
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            accumulated.push_str(&tail);
            display.update(&tail, &accumulated);
        }

        tracing::debug!(bytes = accumulated.len(), "Relay stream completed");
        Ok(accumulated)
    }
}

/// reqwest's top-level message plus its source chain
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Result of one submitted query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The answer streamed to completion and was recorded
    Completed(String),
    /// The exchange failed; the failure text was recorded instead
    Failed(StreamFailure),
}

/// Run one exchange for the current session
///
/// Returns `Ok(None)` without sending anything when `input` is empty or
/// whitespace-only. Otherwise the user message is appended (setting the
/// title if it is the session's first), the answer is streamed into
/// `display`, and the answer or failure text is appended as the bot
/// message. Both messages go to the session that was current when the
/// call started.
///
/// # Errors
///
/// Returns an error only if the current session disappears mid-call.
pub async fn submit(
    store: &mut SessionStore,
    client: &RelayClient,
    input: &str,
    display: &mut dyn ResponseDisplay,
) -> Result<Option<SubmitOutcome>> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    let session_id = store.current_id();
    store.append_message(session_id, Role::User, input)?;

    let outcome = match client.stream_query(input, display).await {
        Ok(answer) => {
            store.append_message(session_id, Role::Bot, answer.as_str())?;
            SubmitOutcome::Completed(answer)
        }
        Err(failure) => {
            tracing::warn!(error = %failure, "Relay exchange failed");
            store.append_message(session_id, Role::Bot, failure.to_string())?;
            SubmitOutcome::Failed(failure)
        }
    };

    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder {
        started: bool,
        finished: bool,
        snapshots: Vec<String>,
    }

    impl ResponseDisplay for Recorder {
        fn start(&mut self) {
            self.started = true;
        }

        fn update(&mut self, _chunk: &str, accumulated: &str) {
            self.snapshots.push(accumulated.to_string());
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    async fn relay_answering(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .and(body_json(serde_json::json!({ "query": "What is X?" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer, timeout: Duration) -> RelayClient {
        RelayClient::new(format!("{}/api/chat/stream", server.uri()), timeout).unwrap()
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            StreamFailure::Connection("refused".to_string()).to_string(),
            "Connection error: refused"
        );
        assert_eq!(
            StreamFailure::Timeout.to_string(),
            "Request timed out. Please try again."
        );
        assert_eq!(
            StreamFailure::Other("boom".to_string()).to_string(),
            "An error occurred: boom"
        );
    }

    #[tokio::test]
    async fn test_stream_query_accumulates_answer() {
        let server = relay_answering("X is a letter.").await;
        let client = client_for(&server, DEFAULT_TIMEOUT);
        let mut display = Recorder::default();

        let answer = client.stream_query("What is X?", &mut display).await.unwrap();

        assert_eq!(answer, "X is a letter.");
        assert!(display.started);
        assert!(display.finished);
        assert_eq!(
            display.snapshots.last().map(String::as_str),
            Some("X is a letter.")
        );
    }

    #[tokio::test]
    async fn test_stream_query_non_success_status_is_generic_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(502).set_body_string(r#"{"error":"model not found"}"#),
            )
            .mount(&server)
            .await;
        let client = client_for(&server, DEFAULT_TIMEOUT);
        let mut display = Recorder::default();

        let failure = client
            .stream_query("What is X?", &mut display)
            .await
            .unwrap_err();

        match failure {
            StreamFailure::Other(detail) => {
                assert!(detail.contains("502"));
                assert!(detail.contains("model not found"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(display.started);
        assert!(display.finished);
        assert!(display.snapshots.is_empty());
    }

    #[tokio::test]
    async fn test_display_finished_when_relay_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client =
            RelayClient::new(format!("http://{}/api/chat/stream", addr), DEFAULT_TIMEOUT).unwrap();
        let mut display = Recorder::default();

        let failure = client
            .stream_query("What is X?", &mut display)
            .await
            .unwrap_err();

        assert!(matches!(failure, StreamFailure::Connection(_)));
        assert!(display.started);
        assert!(display.finished);
        assert!(display.snapshots.is_empty());
    }

    #[tokio::test]
    async fn test_stream_query_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let client = client_for(&server, Duration::from_millis(200));

        let failure = client
            .stream_query("What is X?", &mut NullDisplay)
            .await
            .unwrap_err();
        assert_eq!(failure, StreamFailure::Timeout);
    }

    #[tokio::test]
    async fn test_submit_ignores_blank_input() {
        let server = MockServer::start().await;
        let client = client_for(&server, DEFAULT_TIMEOUT);
        let mut store = SessionStore::new();

        for input in ["", "   ", "\n\t"] {
            let outcome = submit(&mut store, &client, input, &mut NullDisplay)
                .await
                .unwrap();
            assert!(outcome.is_none());
        }

        assert!(store.current().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_records_exchange_and_title() {
        let server = relay_answering("X is a letter.").await;
        let client = client_for(&server, DEFAULT_TIMEOUT);
        let mut store = SessionStore::new();

        let outcome = submit(&mut store, &client, "What is X?", &mut NullDisplay)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Some(SubmitOutcome::Completed("X is a letter.".to_string()))
        );

        let session = store.current();
        assert_eq!(session.title(), "What is X?");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].role(), Role::User);
        assert_eq!(session.messages()[0].content(), "What is X?");
        assert_eq!(session.messages()[1].role(), Role::Bot);
        assert_eq!(session.messages()[1].content(), "X is a letter.");
    }
}
