//! Per-run result summary returned to the caller.

use serde::{Deserialize, Serialize};

/// A per-ticker failure recorded during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
    /// Whether re-invocation can be expected to succeed for this ticker
    pub retryable: bool,
}

/// Aggregate outcome of one pipeline invocation.
///
/// Created fresh per run and never persisted. The caller always receives a
/// summary; `success=false` plus `error` is the sole failure signal at the
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub success: bool,
    pub error: Option<String>,
    pub message: String,
    /// Newly inserted indicator rows across all tickers (skips excluded)
    pub indicators_inserted: u64,
    /// Newly inserted event rows across all tickers (skips excluded)
    pub events_inserted: u64,
    /// Rows left untouched because their natural key already existed
    pub indicators_skipped: u64,
    pub events_skipped: u64,
    /// Raw observations dropped by the normalizer (missing value, bad date)
    pub observations_skipped: u64,
    /// Per-ticker failures; never aborts the remaining tickers
    pub failures: Vec<TickerFailure>,
}

impl RunSummary {
    /// Summary for a run rejected before any I/O.
    pub fn invalid_input(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            error: Some(error.clone()),
            message: format!("Extraction aborted: {}", error),
            indicators_inserted: 0,
            events_inserted: 0,
            indicators_skipped: 0,
            events_skipped: 0,
            observations_skipped: 0,
            failures: Vec::new(),
        }
    }
}
