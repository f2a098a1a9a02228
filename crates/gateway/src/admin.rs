//! Administrative routes.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

pub fn admin_router() -> Router<SharedState> {
    Router::new().route("/admin/reload-data", post(reload_data_handler))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub ok: bool,
    /// Characters of merged notes now held
    pub length: usize,
    pub programs: usize,
}

/// Re-read catalog and notes. Same code path as the file watcher.
async fn reload_data_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    state.check_secret(&headers)?;

    let report = state.knowledge.reload_async().await;
    info!(
        programs = report.programs,
        notes_len = report.notes_len,
        catalog_error = report.catalog_error.as_deref().unwrap_or("none"),
        "Manual knowledge reload"
    );

    Ok(Json(ReloadResponse {
        ok: true,
        length: report.notes_len,
        programs: report.programs,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;

    #[tokio::test]
    async fn reload_requires_secret_when_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.app_secret = Some("s3cret".into());
        let (app, _) = test_app(&config, Arc::new(MockProvider::new("x")));

        let (status, body) = send_json(&app, post_json("/admin/reload-data", json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));

        let mut request = post_json("/admin/reload-data", json!({}));
        request
            .headers_mut()
            .insert("x-app-key", "nope".parse().unwrap());
        let (status, _) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reload_picks_up_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.app_secret = Some("s3cret".into());
        let (app, state) = test_app(&config, Arc::new(MockProvider::new("x")));
        assert!(state.knowledge.list_programs().is_empty());

        fs::write(tmp.path().join("majors.json"), r#"[{"slug":"it","name":"IT"}]"#).unwrap();
        fs::write(tmp.path().join("fees.txt"), "Fees").unwrap();

        let mut request = post_json("/admin/reload-data", json!({}));
        request
            .headers_mut()
            .insert("x-app-key", "s3cret".parse().unwrap());
        let (status, body) = send_json(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "ok": true, "length": "fees.txt:\nFees".chars().count(), "programs": 1 })
        );

        let (_, majors) = send_json(&app, get("/api/majors/it")).await;
        assert_eq!(majors["name"], json!("IT"));
    }

    #[tokio::test]
    async fn reload_is_open_without_secret() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = test_app(&test_config(tmp.path()), Arc::new(MockProvider::new("x")));

        let (status, body) = send_json(&app, post_json("/admin/reload-data", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "length": 0, "programs": 0 }));
    }
}
