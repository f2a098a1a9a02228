//! Configuration loading, validation, and management for campusbot.
//!
//! Loads configuration from `campusbot.toml` (or an explicit path) with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "campusbot.toml";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the upstream completion API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Shared secret checked against the `x-app-key` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,

    /// Upstream model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upstream API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Prompt assembly configuration
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("app_secret", &redact(&self.app_secret))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("upstream", &self.upstream)
            .field("gateway", &self.gateway)
            .field("knowledge", &self.knowledge)
            .field("chat", &self.chat)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on one completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional project scoping header for the upstream API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            project: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the single-page client (index.html + assets)
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// CORS origins. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Gate `POST /api/message` behind the shared secret
    #[serde(default)]
    pub require_message_secret: bool,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    10000
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            body_limit_bytes: default_body_limit(),
            allowed_origins: Vec::new(),
            require_message_secret: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned (non-recursively) for notes
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The structured program catalog. Unset means `majors.json` inside
    /// `data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_file: Option<PathBuf>,

    /// Reload automatically when files under `data_dir` change
    #[serde(default = "default_true")]
    pub watch: bool,

    /// Quiet period after the last change before reloading
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_debounce_ms() -> u64 {
    250
}

/// Catalog file name looked up in `data_dir` when none is configured.
pub const DEFAULT_CATALOG_FILE_NAME: &str = "majors.json";

impl KnowledgeConfig {
    /// Where the catalog is read from.
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_CATALOG_FILE_NAME))
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_file: None,
            watch: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many past turns go upstream with each message
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// How many programs the catalog brief lists
    #[serde(default = "default_brief_limit")]
    pub brief_limit: usize,

    /// Replace the built-in behavioral preamble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_preamble: Option<String>,
}

fn default_history_window() -> usize {
    10
}
fn default_brief_limit() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            brief_limit: default_brief_limit(),
            system_preamble: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (or `./campusbot.toml`), then apply
    /// environment variable overrides:
    /// - `CAMPUSBOT_API_KEY`, then `OPENAI_API_KEY`
    /// - `OPENAI_MODEL`, `OPENAI_BASE_URL`, `OPENAI_PROJECT`
    /// - `APP_SECRET`, `PORT`, `ALLOWED_ORIGINS`
    /// - `DATA_DIR`, `MAJORS_FILE`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("CAMPUSBOT_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(project) = get("OPENAI_PROJECT") {
            self.upstream.project = Some(project);
        }
        if let Some(secret) = get("APP_SECRET") {
            self.app_secret = Some(secret);
        }
        if let Some(port) = get("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT is not a valid port: {port}"))
            })?;
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.gateway.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(dir) = get("DATA_DIR") {
            self.knowledge.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = get("MAJORS_FILE") {
            self.knowledge.catalog_file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.chat.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "chat.history_window must be at least 1".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// The configured shared secret, if non-empty.
    pub fn secret(&self) -> Option<&str> {
        self.app_secret.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            app_secret: None,
            model: default_model(),
            temperature: default_temperature(),
            upstream: UpstreamConfig::default(),
            gateway: GatewayConfig::default(),
            knowledge: KnowledgeConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
