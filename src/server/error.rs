//! HTTP error type for the relay service
//!
//! Handlers return `Result<T, ServerError>`; the [`IntoResponse`] impl turns
//! each variant into a JSON `{"error": "..."}` body with a fitting status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that end a relay request before any body is streamed
#[derive(Debug, Error)]
pub enum ServerError {
    /// The inference provider refused or failed the call
    #[error("upstream provider error: {0}")]
    Upstream(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Upstream(m) => {
                tracing::warn!(error = %m, "Provider call failed before streaming");
                (StatusCode::BAD_GATEWAY, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_maps_to_bad_gateway() {
        let response = ServerError::Upstream("access denied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "access denied");
    }

    #[test]
    fn test_upstream_display_names_provider() {
        let err = ServerError::Upstream("throttled".to_string());
        assert_eq!(err.to_string(), "upstream provider error: throttled");
    }
}
