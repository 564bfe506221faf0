//! HTTP client for a local Ollama server.
//!
//! Handles base URL normalization, timeout management, status checking and
//! error classification. No retries: a failed request ends the caller's turn.

use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use pm_core::config::{AppConfig, LlmConfig};
use pm_core::error::{PmError, PmResult};

/// HTTP client for the Ollama REST API.
#[derive(Clone)]
pub struct OllamaClient {
    pub(crate) inner: Client,
    /// Server origin, e.g. "http://localhost:11434".
    base_url: String,
    /// Model name sent with every chat request.
    pub(crate) model: String,
    /// Sampling temperature.
    pub(crate) temperature: f32,
}

/// One entry of `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

impl OllamaClient {
    /// Create a new client from LLM configuration.
    pub fn new(config: &LlmConfig) -> PmResult<Self> {
        let base_url = AppConfig::sanitize_base_url(&config.base_url);
        if base_url.is_empty() {
            return Err(PmError::MissingConfig("llm.base_url".into()));
        }

        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30));

        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }

        let inner = builder
            .build()
            .map_err(|e| PmError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Get the server origin.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the full URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body and check the status.
    pub(crate) async fn post(&self, path: &str, body: &serde_json::Value) -> PmResult<Response> {
        debug!("POST {path}");
        let response = self
            .inner
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(Self::classify_error)?;
        Self::check_status(response).await
    }

    // --- Server endpoints ---

    /// List locally available models.
    pub async fn list_models(&self) -> PmResult<Vec<ModelTag>> {
        debug!("GET /api/tags");
        let response = self
            .inner
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(Self::classify_error)?;
        let response = Self::check_status(response).await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| PmError::MalformedResponse(format!("failed to parse /api/tags: {e}")))?;
        Ok(tags.models)
    }

    /// Ping the server. Returns the round-trip latency.
    pub async fn health_check(&self) -> PmResult<Duration> {
        let start = Instant::now();
        self.list_models().await?;
        Ok(start.elapsed())
    }

    /// Whether the configured model is pulled on the server. Tags may carry
    /// a `:latest` suffix the configuration omits.
    pub async fn has_model(&self) -> PmResult<bool> {
        let wanted = self.model.as_str();
        Ok(self.list_models().await?.iter().any(|tag| {
            tag.name == wanted || tag.name.strip_suffix(":latest") == Some(wanted)
        }))
    }

    // --- Response helpers ---

    /// Check the HTTP status code and convert to PmError if needed.
    pub(crate) async fn check_status(response: Response) -> PmResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or(body);

        Err(PmError::Llm {
            status: status.as_u16(),
            message,
        })
    }

    /// Classify a reqwest error into a PmError variant.
    pub(crate) fn classify_error(e: reqwest::Error) -> PmError {
        if e.is_timeout() {
            PmError::Timeout(e.to_string())
        } else if e.is_connect() {
            PmError::Http(format!("connection failed: {e}"))
        } else {
            PmError::Http(e.to_string())
        }
    }
}
