//! Typed errors for the verification library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Only document-level failures ([`AnalysisError`]) ever reach the caller.
//! Source-level failures ([`SourceError`]) are absorbed by the retriever and
//! show up as reduced coverage and confidence instead.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced for a single document analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The per-document deadline elapsed before the analysis finished.
    #[error("document analysis timed out after {elapsed_ms}ms")]
    DocumentTimeout { elapsed_ms: u64 },

    /// The caller cancelled the analysis.
    #[error("analysis cancelled")]
    Cancelled,

    /// Content exceeds the configured size limit.
    #[error("content too large: {size} bytes (limit {limit})")]
    ContentTooLarge { size: usize, limit: usize },

    /// The analysis task failed unexpectedly (e.g. panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Build a timeout error from an elapsed duration.
    pub fn timeout(elapsed: Duration) -> Self {
        Self::DocumentTimeout {
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Whether the caller gave up, as opposed to the analysis failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors returned by a knowledge source query.
///
/// These never escape the retriever: the source is skipped and the failure
/// is reflected in `source_coverage`.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("source unavailable: {source_id}: {reason}")]
    Unavailable { source_id: String, reason: String },

    /// The query did not complete within its timeout.
    #[error("query to {source_id} timed out after {timeout_ms}ms")]
    Timeout { source_id: String, timeout_ms: u64 },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The source answered with something we could not interpret.
    #[error("invalid response from {source_id}: {reason}")]
    InvalidResponse { source_id: String, reason: String },

    /// No backend is registered for this source.
    #[error("no query backend routed for source: {source_id}")]
    NotRouted { source_id: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded for source: {source_id}")]
    RateLimited { source_id: String },

    /// Query was aborted by cancellation.
    #[error("query cancelled")]
    Cancelled,
}

/// Errors from the knowledge source registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A source id is referenced that does not exist in configuration.
    #[error("knowledge source not found: {id}")]
    NotFound { id: String },

    /// Reliability weight outside [0, 1].
    #[error("source {id} has reliability {value} outside [0, 1]")]
    InvalidReliability { id: String, value: f64 },

    /// Two sources share an id.
    #[error("duplicate knowledge source id: {id}")]
    DuplicateSource { id: String },

    /// Configuration file could not be read.
    #[error("failed to read source configuration: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from the retrieval step of a single claim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// Operation was cancelled
    #[error("retrieval cancelled")]
    Cancelled,
}

impl From<RetrievalError> for AnalysisError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Cancelled => AnalysisError::Cancelled,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for knowledge source queries.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
