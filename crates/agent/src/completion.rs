//! The upstream call and reply normalization.
//!
//! [`CompletionGateway`] is stateless: it never touches session history.
//! Recording the exchange is the caller's job, and only after success.

use campusbot_config::AppConfig;
use campusbot_core::error::ProviderError;
use campusbot_core::message::Message;
use campusbot_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sampling temperature for every completion.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Returned when the upstream payload carries no usable text.
pub const FALLBACK_REPLY: &str = "received your question, will answer soon";

/// Sends assembled prompts upstream and turns the result into a reply.
pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    timeout: Option<Duration>,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: None,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.model)
            .with_temperature(config.temperature)
            .with_timeout(Duration::from_secs(config.upstream.timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Bound the whole upstream call. Expiry surfaces as
    /// [`ProviderError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Complete `messages` and return the normalized reply.
    ///
    /// Upstream rejections, timeouts and transport failures are returned
    /// as-is. There is no retry.
    pub async fn complete(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        };

        let call = self.provider.complete(request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(provider = self.provider.name(), timeout_secs = limit.as_secs(), "Upstream call timed out");
                ProviderError::Timeout(format!("no reply within {}s", limit.as_secs()))
            })??,
            None => call.await?,
        };

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        Ok(normalize_reply(response.content))
    }
}

/// Trim the completion text; substitute [`FALLBACK_REPLY`] when nothing is left.
pub fn normalize_reply(content: Option<String>) -> String {
    match content.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => FALLBACK_REPLY.to_string(),
    }
}
