//! Relational storage for indicators and derived events.

pub mod postgres;

use async_trait::async_trait;
use eie_core::{EventRecord, IndicatorRecord, Result, Ticker};

pub use postgres::PgIndicatorStore;

/// Row counts for one ticker's upsert batch.
///
/// Skipped rows hit an existing natural key and were left untouched;
/// extraction is append-only for historical integrity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub indicators_inserted: u64,
    pub indicators_skipped: u64,
    pub events_inserted: u64,
    pub events_skipped: u64,
}

/// Transactional, conflict-skipping writer for one ticker batch.
#[async_trait]
pub trait IndicatorStore: Send + Sync {
    /// Write one ticker's records atomically.
    ///
    /// Either all of the batch commits or none of it does; a failure aborts
    /// only this ticker's batch. Natural-key collisions are skipped, not
    /// updated.
    async fn upsert_batch(
        &self,
        ticker: &Ticker,
        indicators: &[IndicatorRecord],
        events: &[EventRecord],
    ) -> Result<UpsertOutcome>;
}
