//! Indicator normalization: raw provider observations → canonical records.
//!
//! Pure and deterministic. Malformed observations are skipped and counted,
//! never failing the run; the skip count is reported distinctly from hard
//! failures.

use chrono::NaiveDate;
use eie_core::{IndicatorKind, IndicatorRecord, Ticker};
use rust_decimal::Decimal;

use crate::provider::RawObservation;

/// Outcome of normalizing one ticker's raw series.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSeries {
    pub records: Vec<IndicatorRecord>,
    /// Observations dropped for a missing value or unparseable fields
    pub skipped: u64,
}

/// Normalize a raw observation series for one ticker.
///
/// Values are rescaled to the fixed precision in [`eie_core::VALUE_SCALE`] so
/// re-running on unchanged upstream data yields byte-identical records. The
/// provider marks missing values as `"."` or an empty string; both are skips,
/// as are entries without a parseable `YYYY-MM-DD` date.
pub fn normalize_series(
    ticker: &Ticker,
    kind: IndicatorKind,
    raw: &[RawObservation],
) -> NormalizedSeries {
    let mut series = NormalizedSeries::default();

    for observation in raw {
        match normalize_one(ticker, kind, observation) {
            Some(record) => series.records.push(record),
            None => {
                series.skipped += 1;
                tracing::debug!(
                    ticker = %ticker,
                    date = observation.date.as_deref().unwrap_or("<missing>"),
                    value = observation.value.as_deref().unwrap_or("<missing>"),
                    "Skipping malformed observation"
                );
            }
        }
    }

    if series.skipped > 0 {
        tracing::warn!(
            ticker = %ticker,
            skipped = series.skipped,
            kept = series.records.len(),
            "Observations skipped during normalization"
        );
    }

    series
}

fn normalize_one(
    ticker: &Ticker,
    kind: IndicatorKind,
    observation: &RawObservation,
) -> Option<IndicatorRecord> {
    let raw_value = observation.value.as_deref()?.trim();
    if raw_value.is_empty() || raw_value == "." {
        return None;
    }

    let date_str = observation.date.as_deref()?.trim();
    let observed_on = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    let value: Decimal = raw_value.parse().ok()?;

    Some(IndicatorRecord::new(ticker.clone(), observed_on, value, kind))
}
