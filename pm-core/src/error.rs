//! Global error types for the property manager.
//!
//! All error categories across the workspace are unified into a single
//! `PmError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using PmError.
pub type PmResult<T> = Result<T, PmError>;

/// Unified error type covering all error categories.
#[derive(Error, Debug)]
pub enum PmError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    /// A store constraint rejected the write (unique email, missing landlord, ...).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A referenced row does not exist.
    #[error("{entity} with ID {id} not found")]
    NotFound {
        /// Entity name, e.g. "Property".
        entity: &'static str,
        /// Requested identity.
        id: i64,
    },

    /// Caller supplied an unusable value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Network / LLM errors --
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The LLM server returned an error response.
    #[error("llm error (status {status}): {message}")]
    Llm {
        /// HTTP status code.
        status: u16,
        /// Error message from the server.
        message: String,
    },

    /// The LLM server answered with a payload we could not interpret.
    #[error("malformed llm response: {0}")]
    MalformedResponse(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service is not yet initialized.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    /// A service operation failed.
    #[error("service error: {0}")]
    Service(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PmError {
    /// Whether this error came from the store refusing a write.
    pub fn is_constraint(&self) -> bool {
        matches!(self, PmError::Constraint(_))
    }

    /// Whether this error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PmError::NotFound { .. })
    }
}

impl From<serde_json::Error> for PmError {
    fn from(e: serde_json::Error) -> Self {
        PmError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for PmError {
    fn from(e: toml::de::Error) -> Self {
        PmError::Config(e.to_string())
    }
}
