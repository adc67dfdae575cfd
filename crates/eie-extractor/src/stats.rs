//! Per-run counters and summary assembly.

use eie_core::{ExtractError, RunSummary, Ticker, TickerFailure};
use eie_data::UpsertOutcome;
use std::time::Duration;

/// Counters accumulated over one pipeline run.
///
/// Tickers are mutually independent, so counters are only ever merged from
/// completed per-ticker outcomes; nothing here is shared between workers.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Tickers supplied by the caller
    pub total: usize,
    /// Tickers whose batch committed
    pub succeeded: usize,
    /// Tickers skipped because the run was cancelled before they started
    pub cancelled: usize,
    /// Newly inserted rows
    pub indicators_inserted: u64,
    pub events_inserted: u64,
    /// Rows left untouched on natural-key collision
    pub indicators_skipped: u64,
    pub events_skipped: u64,
    /// Observations dropped by the normalizer
    pub observations_skipped: u64,
    /// Per-ticker failures, in caller order
    pub failures: Vec<TickerFailure>,
    /// Wall-clock run time
    pub elapsed: Duration,
}

impl RunStats {
    /// New counters for a run over `total` tickers.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Fold in one committed ticker batch.
    pub fn record_success(&mut self, outcome: &UpsertOutcome, observations_skipped: u64) {
        self.succeeded += 1;
        self.indicators_inserted += outcome.indicators_inserted;
        self.indicators_skipped += outcome.indicators_skipped;
        self.events_inserted += outcome.events_inserted;
        self.events_skipped += outcome.events_skipped;
        self.observations_skipped += observations_skipped;
    }

    /// Fold in one failed ticker.
    pub fn record_failure(&mut self, ticker: &Ticker, error: &ExtractError) {
        self.failures.push(TickerFailure {
            ticker: ticker.to_string(),
            error: error.to_string(),
            retryable: error.is_retryable(),
        });
    }

    /// Log the run totals.
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failures.len(),
            cancelled = self.cancelled,
            indicators_inserted = self.indicators_inserted,
            indicators_skipped = self.indicators_skipped,
            events_inserted = self.events_inserted,
            events_skipped = self.events_skipped,
            observations_skipped = self.observations_skipped,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "Extraction run completed"
        );
    }

    /// Assemble the caller-facing summary.
    ///
    /// The run fails as a whole only when every processed ticker failed; a
    /// partial failure keeps `success=true` and names the failed tickers in
    /// the message.
    pub fn into_summary(self) -> RunSummary {
        let failed = self.failures.len();
        let success = failed == 0 || self.succeeded > 0;

        let mut message = if self.total == 0 {
            "No tickers supplied; nothing to extract".to_string()
        } else {
            format!(
                "Processed {} tickers: {} succeeded, {} failed; {} indicators and {} events inserted",
                self.total, self.succeeded, failed,
                self.indicators_inserted, self.events_inserted
            )
        };
        if self.cancelled > 0 {
            message.push_str(&format!("; cancelled before {} tickers", self.cancelled));
        }
        if self.observations_skipped > 0 {
            message.push_str(&format!(
                "; {} malformed observations skipped",
                self.observations_skipped
            ));
        }
        if !self.failures.is_empty() {
            let details: Vec<String> = self
                .failures
                .iter()
                .map(|f| format!("{} ({})", f.ticker, f.error))
                .collect();
            message.push_str(&format!("; failed tickers: {}", details.join(", ")));
        }

        let error = if success {
            None
        } else {
            Some(format!(
                "all {} processed tickers failed; first error: {}",
                failed,
                self.failures
                    .first()
                    .map(|f| f.error.clone())
                    .unwrap_or_default()
            ))
        };

        RunSummary {
            success,
            error,
            message,
            indicators_inserted: self.indicators_inserted,
            events_inserted: self.events_inserted,
            indicators_skipped: self.indicators_skipped,
            events_skipped: self.events_skipped,
            observations_skipped: self.observations_skipped,
            failures: self.failures,
        }
    }
}
