//! Public API routes: catalog reads, session history, and chat.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use campusbot_core::catalog::ProgramRecord;
use campusbot_core::message::{Message, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::SharedState;
use crate::error::ApiError;

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/majors", get(list_majors_handler))
        .route("/api/majors/{slug}", get(get_major_handler))
        .route("/api/history", get(history_handler))
        .route("/api/message", post(message_handler))
}

// --- Catalog ---

async fn list_majors_handler(State(state): State<SharedState>) -> Json<Value> {
    let programs = state.knowledge.list_programs();
    Json(json!({
        "total": programs.len(),
        "items": programs.as_slice(),
    }))
}

async fn get_major_handler(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<ProgramRecord>, ApiError> {
    state
        .knowledge
        .get_program(&slug)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- History ---

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

async fn history_handler(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = SessionId::from(query.session_id.as_deref().unwrap_or_default());
    let messages = state.sessions().all(&session).await?;
    Ok(Json(HistoryResponse { messages }))
}

// --- Chat ---

/// Body of `POST /api/message`. `meta` and any other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,

    /// Kept loose so a non-string value is a validation failure rather
    /// than a deserialization one.
    #[serde(rename = "userMessage", default)]
    pub user_message: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
}

async fn message_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.require_message_secret {
        state.check_secret(&headers)?;
    }

    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected message body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation("userMessage required")
        }
    })?;

    let user_message = match request.user_message {
        Some(Value::String(text)) if !text.is_empty() => text,
        _ => return Err(ApiError::Validation("userMessage required")),
    };
    let session = SessionId::from(request.session_id.as_deref().unwrap_or_default());

    let reply = state.relay.handle(&session, &user_message).await?;
    Ok(Json(MessageResponse { reply }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use campusbot_agent::FALLBACK_REPLY;
    use campusbot_core::error::ProviderError;
    use campusbot_core::message::{Message, SessionId};
    use campusbot_core::session::SessionStore;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;

    const CATALOG: &str = r#"{"items":[
        {"slug":"it","name":"Information Technology","level":"Bachelor","career_group":"Technology","campus":"North"},
        {"slug":"nursing","name":"Nursing","level":"College","tuition_range":[12000000,15000000]}
    ]}"#;

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("majors.json"), CATALOG).unwrap();
        tmp
    }

    #[tokio::test]
    async fn lists_catalog_with_total() {
        let tmp = fixture();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("x")));

        let (status, body) = send_json(&app, get("/api/majors")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(2));
        assert_eq!(body["items"][0]["slug"], json!("it"));
        // Unknown fields are served back verbatim
        assert_eq!(body["items"][0]["campus"], json!("North"));
        assert_eq!(body["items"][1]["tuition_range"], json!([12000000.0, 15000000.0]));
    }

    #[tokio::test]
    async fn major_lookup_and_not_found() {
        let tmp = fixture();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("x")));

        let (status, body) = send_json(&app, get("/api/majors/it")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], json!("Information Technology"));
        assert_eq!(body["level"], json!("Bachelor"));

        let (status, _) = send_json(&app, get("/api/majors/IT")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&app, get("/api/majors/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn empty_catalog_is_served_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("x")));

        let (status, body) = send_json(&app, get("/api/majors")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "total": 0, "items": [] }));
    }

    #[tokio::test]
    async fn history_for_unknown_or_missing_session_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("x")));

        for uri in ["/api/history?sessionId=nobody", "/api/history"] {
            let (status, body) = send_json(&app, get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "messages": [] }));
        }
    }

    #[tokio::test]
    async fn message_round_trip_updates_history() {
        let tmp = fixture();
        let provider = Arc::new(MockProvider::new("  Welcome! Which program interests you?  "));
        let (app, state) = test_app(&test_config(tmp.path()), provider.clone());

        let (status, body) = send_json(
            &app,
            post_json("/api/message", json!({ "sessionId": "abc", "userMessage": "hello", "meta": {"page": "/"} })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reply": "Welcome! Which program interests you?" }));
        assert_eq!(provider.calls(), 1);

        let recent = state.sessions().recent(&SessionId::from("abc"), 10).await.unwrap();
        assert_eq!(
            recent,
            vec![
                Message::user("hello"),
                Message::assistant("Welcome! Which program interests you?")
            ]
        );

        let (_, body) = send_json(&app, get("/api/history?sessionId=abc")).await;
        assert_eq!(body["messages"][0], json!({ "role": "user", "content": "hello" }));
        assert_eq!(body["messages"][1]["role"], json!("assistant"));
    }

    #[tokio::test]
    async fn invalid_user_message_never_calls_upstream() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new("unused"));
        let (app, _) = test_app(&test_config(tmp.path()), provider.clone());

        let bodies = [
            json!({ "sessionId": "s", "userMessage": "" }),
            json!({ "sessionId": "s" }),
            json!({ "sessionId": "s", "userMessage": 42 }),
            json!({ "sessionId": "s", "userMessage": null }),
        ];
        for body in bodies {
            let (status, response) = send_json(&app, post_json("/api/message", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({ "error": "userMessage required" }));
        }

        let raw = Request::builder()
            .method("POST")
            .uri("/api/message")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send_json(&app, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_rejection_is_passed_through() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::failing(ProviderError::ApiError {
            status_code: 401,
            message: "Incorrect API key provided".into(),
        }));
        let (app, state) = test_app(&test_config(tmp.path()), provider);

        let (status, body) = send(
            &app,
            post_json("/api/message", json!({ "sessionId": "s", "userMessage": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(String::from_utf8(body).unwrap(), "Incorrect API key provided");
        assert!(state.sessions().all(&SessionId::from("s")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::failing(ProviderError::Network("refused".into())));
        let (app, _) = test_app(&test_config(tmp.path()), provider);

        let (status, body) = send_json(
            &app,
            post_json("/api/message", json!({ "sessionId": "s", "userMessage": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "server_error" }));
    }

    #[tokio::test]
    async fn blank_reply_becomes_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("   ")));

        let (_, body) = send_json(
            &app,
            post_json("/api/message", json!({ "userMessage": "hi" })),
        )
        .await;
        assert_eq!(body["reply"], json!(FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn message_secret_gate_when_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.app_secret = Some("s3cret".into());
        config.gateway.require_message_secret = true;
        let provider = Arc::new(MockProvider::new("ok"));
        let (app, _) = test_app(&config, provider.clone());

        let body = json!({ "sessionId": "s", "userMessage": "hi" });
        let (status, _) = send_json(&app, post_json("/api/message", body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(provider.calls(), 0);

        let mut request = post_json("/api/message", body);
        request
            .headers_mut()
            .insert("x-app-key", "s3cret".parse().unwrap());
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn message_gate_is_off_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.app_secret = Some("s3cret".into());
        let (app, _) = test_app(&config, Arc::new(MockProvider::new("ok")));

        let (status, _) = send_json(
            &app,
            post_json("/api/message", json!({ "userMessage": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.gateway.body_limit_bytes = 64;
        let provider = Arc::new(MockProvider::new("ok"));
        let (app, _) = test_app(&config, provider.clone());

        let (status, _) = send_json(
            &app,
            post_json("/api/message", json!({ "userMessage": "x".repeat(500) })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(provider.calls(), 0);
    }
}
