//! Relay service HTTP surface
//!
//! Two routes:
//!
//! - `POST /api/chat/stream` relays one query to the inference provider and
//!   streams the generated text back as raw UTF-8 chunks.
//! - `GET /health` reports liveness and uptime.

pub mod error;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{RagchatError, Result};
use crate::providers::{self, InferenceProvider};
use crate::relay::spawn_relay;

pub use error::ServerError;

/// Media type declared on the streaming response
pub const STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Request body of `POST /api/chat/stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Shared, read-only state of the relay service
#[derive(Debug)]
pub struct AppState {
    provider: Arc<dyn InferenceProvider>,
    started_at: Instant,
    channel_capacity: usize,
}

impl AppState {
    pub fn new(provider: Arc<dyn InferenceProvider>, channel_capacity: usize) -> Self {
        Self {
            provider,
            started_at: Instant::now(),
            channel_capacity,
        }
    }
}

/// Build the relay router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat/stream", post(chat_stream))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> std::result::Result<Response, ServerError> {
    tracing::info!(
        provider = state.provider.name(),
        query_len = request.query.len(),
        "Chat stream request accepted"
    );

    let events = state
        .provider
        .converse_stream(&request.query)
        .await
        .map_err(|e| ServerError::Upstream(format!("{:#}", e)))?;

    let body = Body::from_stream(spawn_relay(events, state.channel_capacity));
    Ok(([(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)], body).into_response())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend is running",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Run the relay service until SIGINT or SIGTERM
///
/// # Errors
///
/// Returns an error if the provider cannot be configured, the bind address
/// is invalid, or the listener cannot be bound.
pub async fn serve(config: &Config) -> Result<()> {
    let provider: Arc<dyn InferenceProvider> =
        Arc::from(providers::create_provider(&config.provider).await?);
    let state = Arc::new(AppState::new(provider, config.server.channel_capacity));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|e| {
            RagchatError::Config(format!(
                "Failed to bind {}: {}",
                config.server.bind_address, e
            ))
        })?;
    tracing::info!(addr = %listener.local_addr()?, "Relay service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay service stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
