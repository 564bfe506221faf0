//! Property Manager Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other workspace crates:
//! - Application configuration (server, database, LLM, assistant settings)
//! - Global error type covering all error categories
//! - Structured logging with tracing
//! - Platform data/config directory lookup
//! - Common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{PmError, PmResult};
pub use logging::init_logging;
pub use platform::Platform;
