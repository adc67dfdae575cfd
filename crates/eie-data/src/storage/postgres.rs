//! PostgreSQL upsert store.
//!
//! Writes normalized indicators and derived events with one transaction per
//! ticker batch. Inserts go through UNNEST bulk statements with
//! `ON CONFLICT ... DO NOTHING` on the natural keys, so re-running the
//! pipeline against unchanged upstream data inserts nothing and concurrent
//! runs never duplicate rows.
//!
//! Expected schema (managed externally):
//!
//! - `economic_indicators(ticker, observed_on, kind, value, fetched_at)`
//!   with `PRIMARY KEY (ticker, observed_on, kind)`
//! - `indicator_events(id, ticker, occurred_on, event_type, kind, notes,
//!   created_at)` with `PRIMARY KEY (ticker, occurred_on, event_type)`

use async_trait::async_trait;
use chrono::NaiveDate;
use eie_core::{EventRecord, ExtractError, IndicatorRecord, Result, Ticker};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{IndicatorStore, UpsertOutcome};

/// Postgres-backed indicator store.
#[derive(Clone)]
pub struct PgIndicatorStore {
    pool: PgPool,
}

impl PgIndicatorStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool and wrap it.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| ExtractError::Database(format!("connect failed: {}", e)))?;
        Ok(Self::new(pool))
    }

    /// The underlying pool, for callers that manage shutdown.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IndicatorStore for PgIndicatorStore {
    async fn upsert_batch(
        &self,
        ticker: &Ticker,
        indicators: &[IndicatorRecord],
        events: &[EventRecord],
    ) -> Result<UpsertOutcome> {
        let mut outcome = UpsertOutcome::default();
        if indicators.is_empty() && events.is_empty() {
            return Ok(outcome);
        }

        // One transaction per ticker batch: a partial ticker is never left
        // half-written, and batches for different tickers never contend on
        // the same natural-key range.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_write(ticker, "begin", e))?;

        for chunk in indicators.chunks(500) {
            let tickers: Vec<&str> = chunk.iter().map(|r| r.ticker.as_str()).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|r| r.observed_on).collect();
            let kinds: Vec<&str> = chunk.iter().map(|r| r.kind.as_str()).collect();
            let values: Vec<Decimal> = chunk.iter().map(|r| r.value).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO economic_indicators (ticker, observed_on, kind, value, fetched_at)
                SELECT ticker, observed_on, kind, value, NOW()
                FROM UNNEST($1::text[], $2::date[], $3::text[], $4::numeric[])
                    AS t(ticker, observed_on, kind, value)
                ON CONFLICT (ticker, observed_on, kind) DO NOTHING
                "#,
            )
            .bind(&tickers)
            .bind(&dates)
            .bind(&kinds)
            .bind(&values)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_write(ticker, "indicator insert", e))?;

            outcome.indicators_inserted += result.rows_affected();
        }
        outcome.indicators_skipped = indicators.len() as u64 - outcome.indicators_inserted;

        for chunk in events.chunks(500) {
            let ids: Vec<Uuid> = chunk.iter().map(|e| e.id).collect();
            let tickers: Vec<&str> = chunk.iter().map(|e| e.ticker.as_str()).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|e| e.occurred_on).collect();
            let types: Vec<&str> = chunk.iter().map(|e| e.event_type.as_str()).collect();
            let kinds: Vec<&str> = chunk.iter().map(|e| e.kind.as_str()).collect();
            let notes: Vec<String> = chunk.iter().map(|e| e.notes().to_string()).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO indicator_events
                    (id, ticker, occurred_on, event_type, kind, notes, created_at)
                SELECT id, ticker, occurred_on, event_type, kind, notes::jsonb, NOW()
                FROM UNNEST($1::uuid[], $2::text[], $3::date[], $4::text[], $5::text[], $6::text[])
                    AS t(id, ticker, occurred_on, event_type, kind, notes)
                ON CONFLICT (ticker, occurred_on, event_type) DO NOTHING
                "#,
            )
            .bind(&ids)
            .bind(&tickers)
            .bind(&dates)
            .bind(&types)
            .bind(&kinds)
            .bind(&notes)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_write(ticker, "event insert", e))?;

            outcome.events_inserted += result.rows_affected();
        }
        outcome.events_skipped = events.len() as u64 - outcome.events_inserted;

        tx.commit()
            .await
            .map_err(|e| store_write(ticker, "commit", e))?;

        if outcome.indicators_inserted > 0 || outcome.events_inserted > 0 {
            info!(
                ticker = %ticker,
                indicators_inserted = outcome.indicators_inserted,
                events_inserted = outcome.events_inserted,
                "Ticker batch committed"
            );
        } else {
            debug!(ticker = %ticker, "Ticker batch already up to date");
        }

        Ok(outcome)
    }
}

fn store_write(ticker: &Ticker, stage: &str, err: sqlx::Error) -> ExtractError {
    ExtractError::StoreWrite(format!("{} failed for {}: {}", stage, ticker, err))
}
