//! Static client serving.
//!
//! Files under the public directory are served as-is. Any other path that
//! is not under `/api/` gets `index.html`, so the client can route on its
//! own. Unknown `/api/` paths stay a JSON 404.

use axum::Router;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::ApiError;

pub const INDEX_FILE: &str = "index.html";

/// A router with only a fallback, to be merged last.
pub fn frontend_router(public_dir: PathBuf) -> Router {
    let public_dir = Arc::new(public_dir);
    Router::new().fallback(move |req: Request| {
        let public_dir = Arc::clone(&public_dir);
        async move { serve_static(&public_dir, req).await }
    })
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

async fn serve_static(public_dir: &std::path::Path, req: Request) -> Response {
    if is_api_path(req.uri().path()) {
        return ApiError::NotFound.into_response();
    }

    let service = ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join(INDEX_FILE)));
    match service.oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
