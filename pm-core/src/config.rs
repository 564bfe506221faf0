//! Application configuration management.
//!
//! Handles loading, saving, and accessing application configuration: HTTP
//! server binding, database location, logging, the LLM endpoint and the
//! assistant's conversation policy. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{PmError, PmResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chat assistant behaviour.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Explicit chat sessions kept at once. Opening one more evicts the
    /// least recently used.
    #[serde(default = "default_max_chat_sessions")]
    pub max_chat_sessions: usize,

    /// Seconds an explicit chat session may sit unused before it is dropped.
    /// 0 keeps sessions until they are deleted or evicted.
    #[serde(default = "default_chat_session_idle")]
    pub chat_session_idle_secs: u64,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// LLM (Ollama) endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name passed on every request.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Whole-request timeout in milliseconds. 0 disables the timeout.
    #[serde(default = "default_llm_timeout")]
    pub request_timeout_ms: u64,

    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

/// Chat assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Persona text placed at the top of the system instruction.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Maximum stored non-system history entries per conversation.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Number of most recent non-system entries replayed to the model.
    #[serde(default = "default_context_window")]
    pub context_window_messages: usize,

    /// Append the tool confirmation as its own assistant entry before the
    /// chained reply.
    #[serde(default = "default_true")]
    pub record_tool_confirmation: bool,
}

// Default value functions for serde

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_max_chat_sessions() -> usize {
    256
}

fn default_chat_session_idle() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_base_url() -> String {
    constants::DEFAULT_LLM_BASE_URL.to_string()
}

fn default_llm_model() -> String {
    constants::DEFAULT_LLM_MODEL.to_string()
}

fn default_llm_timeout() -> u64 {
    120_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_persona() -> String {
    constants::DEFAULT_PERSONA.to_string()
}

fn default_history_capacity() -> usize {
    500
}

fn default_context_window() -> usize {
    40
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_chat_sessions: default_max_chat_sessions(),
            chat_session_idle_secs: default_chat_session_idle(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: 0.0,
            request_timeout_ms: default_llm_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            history_capacity: default_history_capacity(),
            context_window_messages: default_context_window(),
            record_tool_confirmation: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> PmResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> PmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> PmResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PmError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PmResult<PathBuf> {
        let config_dir = Platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> PmResult<PathBuf> {
        if self.database.path.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join(constants::DEFAULT_DB_FILE))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> PmResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Socket address string for the HTTP server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Reject values that would make the application misbehave at runtime.
    pub fn validate(&self) -> PmResult<()> {
        if self.server.max_chat_sessions == 0 {
            return Err(PmError::Config("server.max_chat_sessions must be at least 1".into()));
        }
        if self.database.pool_size == 0 {
            return Err(PmError::Config("database.pool_size must be at least 1".into()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(PmError::MissingConfig("llm.base_url".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(PmError::MissingConfig("llm.model".into()));
        }
        if self.assistant.context_window_messages == 0 {
            return Err(PmError::Config(
                "assistant.context_window_messages must be at least 1".into(),
            ));
        }
        if self.assistant.history_capacity < self.assistant.context_window_messages {
            return Err(PmError::Config(
                "assistant.history_capacity must not be smaller than the context window".into(),
            ));
        }
        Ok(())
    }

    /// Normalize an LLM base URL: add a scheme when missing and strip trailing slashes.
    pub fn sanitize_base_url(address: &str) -> String {
        let trimmed = address.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

/// Thread-safe configuration holder for shared access across commands.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone out the current configuration.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}
