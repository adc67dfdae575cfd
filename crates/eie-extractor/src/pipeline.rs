//! Pipeline orchestrator.
//!
//! One run per invocation: validate the ticker list, then per ticker drive
//! fetch → normalize → derive → upsert, catching failures at the ticker
//! boundary so the remaining tickers still process. The caller always gets a
//! `RunSummary`, never a raw error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eie_core::{
    parse_ticker_list, ExtractError, IndicatorKind, Result, RunSummary, Ticker,
};
use eie_data::{
    dedup_series, derive_events, normalize_series, IndicatorSource, IndicatorStore, UpsertOutcome,
};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::ExtractorConfig;
use crate::stats::RunStats;

/// Full indicator catalog, extracted when the caller supplies no tickers.
pub const DEFAULT_TICKERS: &[&str] = &[
    "REAL_GDP",
    "REAL_GDP_PER_CAPITA",
    "TREASURY_YIELD",
    "FEDERAL_FUNDS_RATE",
    "CPI",
    "INFLATION",
    "RETAIL_SALES",
    "DURABLES",
    "UNEMPLOYMENT",
    "NONFARM_PAYROLL",
];

/// Per-run behaviour knobs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Per-ticker fetch timeout; expiry counts as a source outage for that
    /// ticker only
    pub fetch_timeout: Duration,
    /// Delay between sequential upstream requests (rate budget)
    pub request_delay: Duration,
    /// Tickers processed in parallel; 1 means sequential
    pub concurrency: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(500),
            concurrency: 1,
        }
    }
}

impl From<&ExtractorConfig> for ExtractOptions {
    fn from(config: &ExtractorConfig) -> Self {
        Self {
            fetch_timeout: config.source.fetch_timeout(),
            request_delay: config.source.request_delay(),
            concurrency: config.pipeline.concurrency.max(1),
        }
    }
}

/// What one successfully processed ticker contributed.
struct TickerOutcome {
    upsert: UpsertOutcome,
    observations_skipped: u64,
}

/// The pipeline entry point.
///
/// Source and store are injected at construction; the orchestrator holds no
/// other state, so repeated and concurrent runs are safe (writes are
/// idempotent).
pub struct Extractor {
    source: Arc<dyn IndicatorSource>,
    store: Arc<dyn IndicatorStore>,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(
        source: Arc<dyn IndicatorSource>,
        store: Arc<dyn IndicatorStore>,
        options: ExtractOptions,
    ) -> Self {
        Self {
            source,
            store,
            options,
        }
    }

    /// Run the pipeline over a ticker list.
    ///
    /// An empty list is valid and yields a zero-count success.
    pub async fn run(&self, tickers: &[String]) -> RunSummary {
        self.run_with_cancel(tickers, CancellationToken::new())
            .await
    }

    /// Run with cooperative cancellation.
    ///
    /// Cancellation takes effect between tickers; in-flight per-ticker work
    /// either completes or is abandoned without partial writes.
    pub async fn run_with_cancel(
        &self,
        tickers: &[String],
        cancel: CancellationToken,
    ) -> RunSummary {
        let validated: Result<Vec<Ticker>> = tickers.iter().map(Ticker::new).collect();
        match validated {
            Ok(tickers) => self.run_validated(tickers, cancel).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected ticker list before any I/O");
                RunSummary::invalid_input(e.to_string())
            }
        }
    }

    /// Run from the JSON boundary form of the ticker list.
    ///
    /// Accepts a JSON array of strings or a JSON-encoded string of one, as
    /// the invocation interface does. Validation failure yields a failed
    /// summary without touching the store.
    pub async fn run_json(&self, tickers_list: &serde_json::Value) -> RunSummary {
        match parse_ticker_list(tickers_list) {
            Ok(tickers) => self.run_validated(tickers, CancellationToken::new()).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected ticker list before any I/O");
                RunSummary::invalid_input(e.to_string())
            }
        }
    }

    async fn run_validated(&self, tickers: Vec<Ticker>, cancel: CancellationToken) -> RunSummary {
        let start = Instant::now();
        let mut stats = RunStats::new(tickers.len());

        tracing::info!(tickers = tickers.len(), "Extraction run starting");

        let results = if self.options.concurrency > 1 {
            self.run_parallel(&tickers, &cancel).await
        } else {
            self.run_sequential(&tickers, &cancel).await
        };

        for (ticker, result) in results {
            match result {
                None => stats.cancelled += 1,
                Some(Ok(outcome)) => {
                    stats.record_success(&outcome.upsert, outcome.observations_skipped)
                }
                Some(Err(e)) => {
                    tracing::error!(ticker = %ticker, error = %e, "Ticker failed");
                    stats.record_failure(&ticker, &e);
                }
            }
        }

        stats.elapsed = start.elapsed();
        stats.log_summary();
        stats.into_summary()
    }

    /// Default mode: tickers one at a time, in caller order, with the rate
    /// budget delay between requests and a cancellation checkpoint after
    /// each ticker.
    async fn run_sequential(
        &self,
        tickers: &[Ticker],
        cancel: &CancellationToken,
    ) -> Vec<(Ticker, Option<Result<TickerOutcome>>)> {
        let mut results = Vec::with_capacity(tickers.len());
        for (idx, ticker) in tickers.iter().enumerate() {
            if cancel.is_cancelled() {
                results.push((ticker.clone(), None));
                continue;
            }
            let result = self.process_ticker(ticker).await;
            results.push((ticker.clone(), Some(result)));

            if idx + 1 < tickers.len() {
                tokio::time::sleep(self.options.request_delay).await;
            }
        }
        if cancel.is_cancelled() {
            tracing::warn!("Run cancelled; remaining tickers abandoned");
        }
        results
    }

    /// Bounded worker pool. Each ticker's fetch→write chain runs end-to-end
    /// on one worker and counters are merged afterwards, so the outcome
    /// matches the sequential mode.
    async fn run_parallel(
        &self,
        tickers: &[Ticker],
        cancel: &CancellationToken,
    ) -> Vec<(Ticker, Option<Result<TickerOutcome>>)> {
        let mut indexed: Vec<(usize, Ticker, Option<Result<TickerOutcome>>)> =
            stream::iter(tickers.iter().cloned().enumerate())
                .map(|(idx, ticker)| {
                    let cancel = cancel.clone();
                    async move {
                        if cancel.is_cancelled() {
                            return (idx, ticker, None);
                        }
                        let result = self.process_ticker(&ticker).await;
                        (idx, ticker, Some(result))
                    }
                })
                .buffer_unordered(self.options.concurrency)
                .collect()
                .await;

        // Report in caller-supplied order regardless of completion order.
        indexed.sort_by_key(|(idx, _, _)| *idx);
        indexed
            .into_iter()
            .map(|(_, ticker, result)| (ticker, result))
            .collect()
    }

    /// One ticker end to end: resolve → fetch → normalize → derive → upsert.
    async fn process_ticker(&self, ticker: &Ticker) -> Result<TickerOutcome> {
        let kind = IndicatorKind::from_ticker(ticker.as_str())
            .ok_or_else(|| ExtractError::UnknownTicker(ticker.to_string()))?;

        let raw = tokio::time::timeout(self.options.fetch_timeout, self.source.fetch(ticker))
            .await
            .map_err(|_| {
                ExtractError::SourceUnavailable(format!(
                    "fetch timed out after {}s for {}",
                    self.options.fetch_timeout.as_secs(),
                    ticker
                ))
            })?
            .map_err(ExtractError::from)?;

        let normalized = normalize_series(ticker, kind, &raw);
        let observations_skipped = normalized.skipped;
        let series = dedup_series(normalized.records);
        let events = derive_events(&series);

        tracing::debug!(
            ticker = %ticker,
            observations = raw.len(),
            records = series.len(),
            events = events.len(),
            skipped = observations_skipped,
            "Ticker normalized and derived"
        );

        let upsert = self.store.upsert_batch(ticker, &series, &events).await?;
        Ok(TickerOutcome {
            upsert,
            observations_skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use eie_core::{EventRecord, IndicatorRecord};
    use eie_data::{RawObservation, SourceError};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum MockResponse {
        Ok(Vec<RawObservation>),
        Outage,
        Hang,
    }

    #[derive(Default)]
    struct MockSource {
        responses: HashMap<String, MockResponse>,
    }

    impl MockSource {
        fn with(mut self, ticker: &str, response: MockResponse) -> Self {
            self.responses.insert(ticker.to_string(), response);
            self
        }
    }

    #[async_trait]
    impl IndicatorSource for MockSource {
        async fn fetch(&self, ticker: &Ticker) -> std::result::Result<Vec<RawObservation>, SourceError> {
            match self.responses.get(ticker.as_str()) {
                Some(MockResponse::Ok(observations)) => Ok(observations.clone()),
                Some(MockResponse::Outage) => {
                    Err(SourceError::Unavailable("simulated outage".to_string()))
                }
                Some(MockResponse::Hang) => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
                None => Err(SourceError::UnknownTicker(ticker.to_string())),
            }
        }
    }

    /// Conflict-skipping in-memory store keyed by the natural keys.
    #[derive(Default)]
    struct MemoryStore {
        indicators: Mutex<HashMap<(String, NaiveDate, String), Decimal>>,
        events: Mutex<HashMap<(String, NaiveDate, String), serde_json::Value>>,
        write_calls: AtomicUsize,
    }

    #[async_trait]
    impl IndicatorStore for MemoryStore {
        async fn upsert_batch(
            &self,
            _ticker: &Ticker,
            indicators: &[IndicatorRecord],
            events: &[EventRecord],
        ) -> Result<UpsertOutcome> {
            self.write_calls.fetch_add(1, Ordering::SeqCst);
            let mut outcome = UpsertOutcome::default();

            let mut stored = self.indicators.lock().unwrap();
            for record in indicators {
                let key = (
                    record.ticker.to_string(),
                    record.observed_on,
                    record.kind.as_str().to_string(),
                );
                if stored.contains_key(&key) {
                    outcome.indicators_skipped += 1;
                } else {
                    stored.insert(key, record.value);
                    outcome.indicators_inserted += 1;
                }
            }

            let mut stored_events = self.events.lock().unwrap();
            for event in events {
                let key = (
                    event.ticker.to_string(),
                    event.occurred_on,
                    event.event_type.as_str().to_string(),
                );
                if stored_events.contains_key(&key) {
                    outcome.events_skipped += 1;
                } else {
                    stored_events.insert(key, event.notes());
                    outcome.events_inserted += 1;
                }
            }

            Ok(outcome)
        }
    }

    fn observations(entries: &[(&str, &str)]) -> Vec<RawObservation> {
        entries
            .iter()
            .map(|(date, value)| RawObservation::new(*date, *value))
            .collect()
    }

    fn extractor(source: MockSource, store: Arc<MemoryStore>) -> Extractor {
        Extractor::new(
            Arc::new(source),
            store,
            ExtractOptions {
                fetch_timeout: Duration::from_millis(200),
                request_delay: Duration::ZERO,
                concurrency: 1,
            },
        )
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_ticker_list_is_success() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(MockSource::default(), store.clone());

        let summary = pipeline.run(&[]).await;
        assert!(summary.success);
        assert!(summary.error.is_none());
        assert_eq!(summary.indicators_inserted, 0);
        assert_eq!(summary.events_inserted, 0);
    }

    #[tokio::test]
    async fn test_invalid_ticker_fails_without_store_writes() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(MockSource::default(), store.clone());

        let summary = pipeline.run(&tickers(&["CPI", "   "])).await;
        assert!(!summary.success);
        assert!(summary.error.is_some());
        assert_eq!(summary.indicators_inserted, 0);
        assert_eq!(store.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_json_rejects_null_and_non_strings() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(MockSource::default(), store.clone());

        let summary = pipeline.run_json(&serde_json::Value::Null).await;
        assert!(!summary.success);

        let summary = pipeline.run_json(&serde_json::json!(["CPI", 1])).await;
        assert!(!summary.success);
        assert_eq!(store.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_ticker_inserts_and_derives() {
        let source = MockSource::default().with(
            "CPI",
            MockResponse::Ok(observations(&[
                ("2024-01-01", "100"),
                ("2024-02-01", "100"),
                ("2024-03-01", "105"),
            ])),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["CPI"])).await;
        assert!(summary.success);
        assert_eq!(summary.indicators_inserted, 3);
        // One change between the second and third observation, none between
        // the two equal values.
        assert_eq!(summary.events_inserted, 1);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let source = MockSource::default().with(
            "CPI",
            MockResponse::Ok(observations(&[
                ("2024-01-01", "100"),
                ("2024-02-01", "105"),
            ])),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let first = pipeline.run(&tickers(&["CPI"])).await;
        assert_eq!(first.indicators_inserted, 2);
        assert_eq!(first.events_inserted, 1);

        let second = pipeline.run(&tickers(&["CPI"])).await;
        assert!(second.success);
        assert_eq!(second.indicators_inserted, 0);
        assert_eq!(second.events_inserted, 0);
        assert_eq!(second.indicators_skipped, 2);
        assert_eq!(second.events_skipped, 1);

        // Stored rows are identical after both runs.
        assert_eq!(store.indicators.lock().unwrap().len(), 2);
        assert_eq!(store.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ticker_mixed_with_valid() {
        let source = MockSource::default().with(
            "CPI",
            MockResponse::Ok(observations(&[("2024-01-01", "100")])),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["CPI", "XYZ"])).await;
        assert!(summary.success);
        assert_eq!(summary.indicators_inserted, 1);
        assert!(summary.message.contains("XYZ"));
        assert_eq!(summary.failures.len(), 1);
        assert!(!summary.failures[0].retryable);
    }

    #[tokio::test]
    async fn test_outage_does_not_abort_other_tickers() {
        let source = MockSource::default()
            .with(
                "CPI",
                MockResponse::Ok(observations(&[
                    ("2024-01-01", "100"),
                    ("2024-02-01", "101"),
                ])),
            )
            .with("REAL_GDP", MockResponse::Outage);
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["REAL_GDP", "CPI"])).await;
        assert!(summary.success);
        assert_eq!(summary.indicators_inserted, 2);
        assert!(summary.message.contains("REAL_GDP"));
        assert!(summary.failures[0].retryable);
    }

    #[tokio::test]
    async fn test_all_tickers_failing_fails_the_run() {
        let source = MockSource::default()
            .with("CPI", MockResponse::Outage)
            .with("REAL_GDP", MockResponse::Outage);
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["CPI", "REAL_GDP"])).await;
        assert!(!summary.success);
        assert!(summary.error.unwrap().contains("failed"));
        assert_eq!(summary.indicators_inserted, 0);
    }

    #[tokio::test]
    async fn test_fetch_timeout_counts_as_outage() {
        let source = MockSource::default().with("CPI", MockResponse::Hang);
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["CPI"])).await;
        assert!(!summary.success);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].retryable);
        assert!(summary.failures[0].error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_malformed_observations_skip_without_failing() {
        let source = MockSource::default().with(
            "CPI",
            MockResponse::Ok(observations(&[
                ("2024-01-01", "."),
                ("2024-02-01", "100"),
            ])),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let summary = pipeline.run(&tickers(&["CPI"])).await;
        assert!(summary.success);
        assert_eq!(summary.indicators_inserted, 1);
        assert_eq!(summary.observations_skipped, 1);
    }

    #[tokio::test]
    async fn test_parallel_run_matches_sequential_counts() {
        let source = MockSource::default()
            .with(
                "CPI",
                MockResponse::Ok(observations(&[
                    ("2024-01-01", "100"),
                    ("2024-02-01", "105"),
                ])),
            )
            .with(
                "UNEMPLOYMENT",
                MockResponse::Ok(observations(&[
                    ("2024-01-01", "3.7"),
                    ("2024-02-01", "3.9"),
                ])),
            )
            .with("XYZ", MockResponse::Outage);
        let store = Arc::new(MemoryStore::default());
        let mut pipeline = extractor(source, store.clone());
        pipeline.options.concurrency = 3;

        let summary = pipeline
            .run(&tickers(&["CPI", "UNEMPLOYMENT", "XYZ"]))
            .await;
        assert!(summary.success);
        assert_eq!(summary.indicators_inserted, 4);
        assert_eq!(summary.events_inserted, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].ticker, "XYZ");
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_writes_nothing() {
        let source = MockSource::default().with(
            "CPI",
            MockResponse::Ok(observations(&[("2024-01-01", "100")])),
        );
        let store = Arc::new(MemoryStore::default());
        let pipeline = extractor(source, store.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = pipeline
            .run_with_cancel(&tickers(&["CPI"]), cancel)
            .await;
        assert_eq!(summary.indicators_inserted, 0);
        assert_eq!(store.write_calls.load(Ordering::SeqCst), 0);
    }
}
