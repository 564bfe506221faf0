//! CLI command implementations.

pub mod serve;
pub mod chat;
pub mod status;
pub mod db;
pub mod issues;

use pm_core::config::ConfigHandle;
use pm_core::error::PmResult;
use pm_llm::OllamaClient;
use pm_models::Database;
use pm_services::{DirectoryService, Service};

/// Helper to initialize the database from config.
pub async fn init_database(config: &ConfigHandle) -> PmResult<Database> {
    let cfg = config.read().await;
    let db_path = cfg.effective_db_path()?;
    Database::init(&db_path, &cfg.database)
}

/// Helper to open the database behind a running directory service.
pub async fn init_directory(config: &ConfigHandle) -> PmResult<DirectoryService> {
    let mut directory = DirectoryService::new(init_database(config).await?);
    directory.init()?;
    Ok(directory)
}

/// Helper to create a model client from config.
pub async fn create_llm_client(config: &ConfigHandle) -> PmResult<OllamaClient> {
    let llm_config = config.read().await.llm.clone();
    OllamaClient::new(&llm_config)
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars > 3 {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_chars).collect()
    }
}
