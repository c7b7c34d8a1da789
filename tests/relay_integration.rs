//! Relay service integration tests
//!
//! Runs the real router on a local port with a scripted provider and talks
//! to it over HTTP, both with plain `reqwest` and with the session client.

mod common;

use std::time::Duration;

use futures::StreamExt;

use ragchat::client::{ResponseDisplay, StreamFailure, DEFAULT_TIMEOUT};
use ragchat::providers::scripted::ScriptStep;
use ragchat::providers::{ContentDelta, ScriptedProvider, StreamEvent};
use ragchat::RelayClient;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Snapshots(Vec<String>);

impl ResponseDisplay for Snapshots {
    fn update(&mut self, _chunk: &str, accumulated: &str) {
        self.0.push(accumulated.to_string());
    }
}

fn hello_provider() -> ScriptedProvider {
    ScriptedProvider::from_events(vec![
        StreamEvent::MessageStart {
            role: "assistant".to_string(),
        },
        StreamEvent::ContentBlockStart { index: 0 },
        StreamEvent::text("Hi"),
        StreamEvent::text(""),
        StreamEvent::ContentBlockDelta {
            index: 0,
            delta: ContentDelta::NonText,
        },
        StreamEvent::text(" there"),
        StreamEvent::ContentBlockStop { index: 0 },
        StreamEvent::MessageStop {
            stop_reason: "end_turn".to_string(),
        },
        StreamEvent::Metadata {
            input_tokens: Some(1),
            output_tokens: Some(2),
        },
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stream_endpoint_relays_only_non_empty_text() {
    let provider = hello_provider();
    let relay = common::spawn_relay(provider.clone()).await;

    let response = reqwest::Client::new()
        .post(relay.stream_url())
        .json(&serde_json::json!({ "query": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let body: Vec<u8> = response
        .bytes_stream()
        .map(|chunk| chunk.unwrap().to_vec())
        .concat()
        .await;
    assert_eq!(String::from_utf8(body).unwrap(), "Hi there");
    assert_eq!(provider.queries(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_client_sees_each_delta_incrementally() {
    let relay = common::spawn_relay(hello_provider()).await;
    let client = RelayClient::new(relay.stream_url(), DEFAULT_TIMEOUT).unwrap();
    let mut display = Snapshots::default();

    let answer = client.stream_query("hello", &mut display).await.unwrap();

    assert_eq!(answer, "Hi there");
    assert_eq!(display.0.last().map(String::as_str), Some("Hi there"));
    assert!(display.0.iter().all(|s| "Hi there".starts_with(s.as_str())));
}

#[tokio::test]
async fn test_provider_rejection_is_reported_to_client() {
    let relay = common::spawn_relay(ScriptedProvider::rejecting("model not found")).await;

    let response = reqwest::Client::new()
        .post(relay.stream_url())
        .json(&serde_json::json!({ "query": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("model not found"));

    let client = RelayClient::new(relay.stream_url(), DEFAULT_TIMEOUT).unwrap();
    let failure = client
        .stream_query("hello", &mut Snapshots::default())
        .await
        .unwrap_err();
    assert!(failure.to_string().starts_with("An error occurred: "));
    assert!(failure.to_string().contains("502"));
}

#[tokio::test]
async fn test_mid_stream_failure_is_not_a_clean_end() {
    let provider = ScriptedProvider::from_steps(vec![
        ScriptStep::Event(StreamEvent::text("partial")),
        ScriptStep::Fail("throttled".to_string()),
    ]);
    let relay = common::spawn_relay(provider).await;
    let client = RelayClient::new(relay.stream_url(), DEFAULT_TIMEOUT).unwrap();
    let mut display = Snapshots::default();

    let failure = client.stream_query("hello", &mut display).await.unwrap_err();

    assert!(matches!(failure, StreamFailure::Other(_)));
    assert_eq!(display.0, vec!["partial".to_string()]);
}

#[tokio::test]
async fn test_stalled_stream_times_out_on_client() {
    let provider = ScriptedProvider::from_steps(vec![
        ScriptStep::Event(StreamEvent::text("first")),
        ScriptStep::Hang,
    ]);
    let relay = common::spawn_relay(provider).await;
    let client = RelayClient::new(relay.stream_url(), Duration::from_millis(300)).unwrap();
    let mut display = Snapshots::default();

    let failure = client.stream_query("hello", &mut display).await.unwrap_err();

    assert_eq!(failure, StreamFailure::Timeout);
    assert_eq!(display.0, vec!["first".to_string()]);
}

#[tokio::test]
async fn test_health_reports_uptime() {
    let relay = common::spawn_relay(ScriptedProvider::default()).await;

    let body: serde_json::Value = reqwest::get(relay.health_url())
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Backend is running");
    assert!(body["uptime_seconds"].as_u64().is_some());
}
