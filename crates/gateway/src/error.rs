//! Mapping of pipeline failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use campusbot_agent::RelayError;
use campusbot_core::error::{MemoryError, ProviderError};
use serde_json::json;
use tracing::error;

/// Upstream error bodies are cut to this many characters before being
/// passed back to the client.
pub const MAX_UPSTREAM_ERROR_CHARS: usize = 2_000;

#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{"error": <message>}`
    Validation(&'static str),
    /// 401, shared secret missing or wrong
    Unauthorized,
    /// 404
    NotFound,
    /// 413, request body over the configured limit
    PayloadTooLarge,
    /// The upstream answered with a non-success status
    Upstream { status: u16, body: String },
    /// The upstream did not answer in time
    UpstreamTimeout,
    /// Anything else. Details are logged, never returned.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(message) => (status, Json(json!({ "error": message }))).into_response(),
            Self::Unauthorized => (status, Json(json!({ "error": "Unauthorized" }))).into_response(),
            Self::NotFound => (status, Json(json!({ "error": "Not found" }))).into_response(),
            Self::PayloadTooLarge => {
                (status, Json(json!({ "error": "Payload too large" }))).into_response()
            }
            Self::Upstream { body, .. } => {
                let body = if body.trim().is_empty() {
                    "Upstream error".to_string()
                } else {
                    body.chars().take(MAX_UPSTREAM_ERROR_CHARS).collect()
                };
                (status, body).into_response()
            }
            Self::UpstreamTimeout => (status, "Upstream timeout").into_response(),
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (status, Json(json!({ "error": "server_error" }))).into_response()
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::ApiError {
                status_code,
                message,
            } => Self::Upstream {
                status: status_code,
                body: message,
            },
            ProviderError::Timeout(_) => Self::UpstreamTimeout,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<MemoryError> for ApiError {
    fn from(e: MemoryError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::EmptyMessage => Self::Validation("userMessage required"),
            RelayError::Provider(e) => e.into(),
            RelayError::Memory(e) => e.into(),
        }
    }
}
