//! HTTP gateway for campusbot.
//!
//! Routes:
//! - `GET  /api/majors`, `GET /api/majors/{slug}` - catalog reads
//! - `GET  /api/history?sessionId=` - a session's turns
//! - `POST /api/message` - the chat pipeline
//! - `POST /admin/reload-data` - reload catalog and notes (shared secret)
//! - `GET  /health`, `GET /healthz` - probes
//! - anything else - static client with single-page fallback
//!
//! Built on Axum.

pub mod admin;
pub mod api;
pub mod error;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use campusbot_agent::{ChatRelay, CompletionGateway, PromptAssembler};
use campusbot_config::{AppConfig, GatewayConfig};
use campusbot_core::provider::Provider;
use campusbot_core::session::SessionStore;
use campusbot_knowledge::{KnowledgeStore, spawn_watcher};
use campusbot_memory::InMemorySessionStore;
use campusbot_providers::OpenAiCompatProvider;

pub use error::ApiError;

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-app-key";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub knowledge: Arc<KnowledgeStore>,
    pub relay: Arc<ChatRelay>,
    pub app_secret: Option<String>,
    pub require_message_secret: bool,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(knowledge: Arc<KnowledgeStore>, relay: Arc<ChatRelay>) -> Self {
        Self {
            knowledge,
            relay,
            app_secret: None,
            require_message_secret: false,
        }
    }

    /// Wire the full pipeline from config around the given provider and
    /// stores.
    pub fn from_config(
        config: &AppConfig,
        knowledge: Arc<KnowledgeStore>,
        sessions: Arc<dyn SessionStore>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        let assembler = PromptAssembler::from_config(knowledge.clone(), sessions.clone(), &config.chat);
        let completion = CompletionGateway::from_config(provider, config);
        let relay = Arc::new(ChatRelay::new(assembler, completion, sessions));

        let mut state = Self::new(knowledge, relay);
        state.app_secret = config.secret().map(String::from);
        state.require_message_secret = config.gateway.require_message_secret;
        state
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        self.relay.sessions()
    }

    /// Passes when no secret is configured, or when the request carries
    /// the configured one in [`SECRET_HEADER`].
    pub fn check_secret(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = self.app_secret.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        match provided {
            Some(got) if constant_time_eq(got.as_bytes(), expected.as_bytes()) => Ok(()),
            _ => {
                warn!("Rejected request with missing or wrong shared secret");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Build the full router: API, admin, probes, static client, and the
/// body limit / CORS / trace layers.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(healthz_handler))
        .merge(api::api_router())
        .merge(admin::admin_router())
        .with_state(state)
        .merge(frontend::frontend_router(gateway.public_dir.clone()))
        .layer(DefaultBodyLimit::max(gateway.body_limit_bytes))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Any origin when `origins` is empty, otherwise exactly the listed ones.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

/// Log what is configured without revealing secrets. Missing pieces are
/// warnings; the server still starts.
pub fn log_environment(config: &AppConfig) {
    let key_len = config.api_key.as_deref().map_or(0, str::len);
    if key_len == 0 {
        warn!("No upstream API key configured (set OPENAI_API_KEY); chat requests will be rejected upstream");
    }
    if !config.knowledge.data_dir.is_dir() {
        warn!(dir = %config.knowledge.data_dir.display(), "Data directory missing; starting with empty knowledge");
    }
    if !config.gateway.public_dir.is_dir() {
        warn!(dir = %config.gateway.public_dir.display(), "Public directory missing; static client unavailable");
    }
    info!(
        api_key_len = key_len,
        model = %config.model,
        base_url = %config.upstream.base_url,
        project = config.upstream.project.as_deref().unwrap_or("(empty)"),
        secret = if config.secret().is_some() { "set" } else { "unset" },
        "Environment check"
    );
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    log_environment(&config);

    let knowledge = Arc::new(KnowledgeStore::from_config(&config.knowledge));
    let report = knowledge.reload_async().await;
    info!(programs = report.programs, notes_len = report.notes_len, "Knowledge loaded");

    // Kept alive for the life of the server
    let _watch = if config.knowledge.watch {
        match spawn_watcher(
            knowledge.clone(),
            Duration::from_millis(config.knowledge.debounce_ms),
        ) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "File watching disabled");
                None
            }
        }
    } else {
        None
    };

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config)?);
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let state = Arc::new(GatewayState::from_config(&config, knowledge, sessions, provider));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, model = %config.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// --- Probes ---

async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn healthz_handler() -> Json<Value> {
    Json(json!({ "ok": true, "ts": chrono::Utc::now().timestamp_millis() }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use campusbot_core::error::ProviderError;
    use campusbot_core::provider::{ProviderRequest, ProviderResponse, Usage};
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Lightweight mock provider for gateway tests.
    pub struct MockProvider {
        outcome: Result<String, ProviderError>,
        calls: Mutex<usize>,
    }

    impl MockProvider {
        pub fn new(text: &str) -> Self {
            Self {
                outcome: Ok(text.to_string()),
                calls: Mutex::new(0),
            }
        }

        pub fn failing(error: ProviderError) -> Self {
            Self {
                outcome: Err(error),
                calls: Mutex::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.outcome.clone().map(|text| ProviderResponse {
                content: Some(text),
                model: request.model,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
            })
        }
    }

    /// Config pointing the knowledge store and static client at `dir`.
    pub fn test_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.knowledge.data_dir = dir.to_path_buf();
        config.knowledge.catalog_file = Some(dir.join("majors.json"));
        config.gateway.public_dir = dir.join("public");
        config
    }

    pub fn test_app(config: &AppConfig, provider: Arc<MockProvider>) -> (Router, SharedState) {
        let knowledge = Arc::new(KnowledgeStore::from_config(&config.knowledge));
        knowledge.reload();
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let state = Arc::new(GatewayState::from_config(config, knowledge, sessions, provider));
        (build_router(state.clone(), &config.gateway), state)
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}
