//! Error types for the extraction pipeline.
//!
//! Per-ticker failures are caught at the ticker boundary and folded into the
//! run summary; only input validation and run-level store failures surface to
//! the caller directly.

use thiserror::Error;

/// Pipeline error taxonomy.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Malformed ticker list; fails the run before any I/O
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream has no data for this ticker; not retryable
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Transient upstream failure; safe to retry by re-invocation
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Transaction aborted for one ticker batch
    #[error("Store write failure: {0}")]
    StoreWrite(String),

    /// Database error outside a ticker batch (connect, pool)
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Whether a re-invocation can be expected to succeed.
    ///
    /// Writes are idempotent, so transient source and store failures are
    /// always safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::SourceUnavailable(_)
                | ExtractError::StoreWrite(_)
                | ExtractError::Database(_)
        )
    }
}
