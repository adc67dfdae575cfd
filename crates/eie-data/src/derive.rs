//! Event derivation from normalized indicator series.
//!
//! Operates on the full per-ticker series because change detection needs the
//! prior observation. The input is sorted defensively; callers are not
//! required to pre-sort.

use eie_core::{EventRecord, EventType, IndicatorKind, IndicatorRecord};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sort a per-ticker series and resolve duplicate observation dates.
///
/// Output is ordered ascending by `(kind, observed_on)`. When two
/// observations share a date within a kind, the later-fetched one wins
/// (last-write-wins) and only one is passed forward, so neither the writer
/// nor the deriver ever sees the shadowed duplicate.
pub fn dedup_series(series: Vec<IndicatorRecord>) -> Vec<IndicatorRecord> {
    let mut by_kind: BTreeMap<IndicatorKind, Vec<IndicatorRecord>> = BTreeMap::new();
    for record in series {
        by_kind.entry(record.kind).or_default().push(record);
    }

    let mut deduped: Vec<IndicatorRecord> = Vec::new();
    for (_, mut records) in by_kind {
        // Stable sort keeps fetch order within equal dates, so replacing on
        // an equal date keeps the last-fetched record.
        records.sort_by_key(|r| r.observed_on);
        for record in records {
            match deduped.last_mut() {
                Some(last)
                    if last.kind == record.kind && last.observed_on == record.observed_on =>
                {
                    *last = record;
                }
                _ => deduped.push(record),
            }
        }
    }
    deduped
}

/// Derive calendar events from one ticker's normalized series.
///
/// The series is deduplicated and sorted first (see [`dedup_series`]). One
/// event is produced per consecutive value change within a kind; equal
/// neighbouring values produce none.
pub fn derive_events(series: &[IndicatorRecord]) -> Vec<EventRecord> {
    let deduped = dedup_series(series.to_vec());

    let mut events = Vec::new();
    for pair in deduped.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if previous.kind != current.kind {
            continue;
        }
        let delta = current.value - previous.value;
        if delta.is_zero() {
            continue;
        }
        events.push(EventRecord {
            id: Uuid::new_v4(),
            ticker: current.ticker.clone(),
            occurred_on: current.observed_on,
            event_type: EventType::classify(current.kind, delta),
            kind: current.kind,
            previous_value: previous.value,
            new_value: current.value,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use eie_core::Ticker;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(day: u32, value: Decimal, kind: IndicatorKind) -> IndicatorRecord {
        IndicatorRecord::new(
            Ticker::new("GDP").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            value,
            kind,
        )
    }

    #[test]
    fn test_single_change_emits_one_event() {
        let series = vec![
            record(1, dec!(100), IndicatorKind::Gdp),
            record(2, dec!(100), IndicatorKind::Gdp),
            record(3, dec!(105), IndicatorKind::Gdp),
        ];
        let events = derive_events(&series);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::ValueChange);
        assert_eq!(
            events[0].occurred_on,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert_eq!(events[0].previous_value, dec!(100.0000));
        assert_eq!(events[0].new_value, dec!(105.0000));
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_derivation() {
        let series = vec![
            record(3, dec!(105), IndicatorKind::Gdp),
            record(1, dec!(100), IndicatorKind::Gdp),
            record(2, dec!(100), IndicatorKind::Gdp),
        ];
        let events = derive_events(&series);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].occurred_on,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_duplicate_timestamp_last_write_wins() {
        // The second day-2 observation replaces the first; with 100 -> 100
        // remaining, no event is emitted.
        let series = vec![
            record(1, dec!(100), IndicatorKind::Gdp),
            record(2, dec!(105), IndicatorKind::Gdp),
            record(2, dec!(100), IndicatorKind::Gdp),
        ];
        assert!(derive_events(&series).is_empty());

        let deduped = dedup_series(series);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[1].value, dec!(100.0000));
    }

    #[test]
    fn test_rate_series_classified_by_direction() {
        let series = vec![
            record(1, dec!(5.25), IndicatorKind::FedFundsRate),
            record(2, dec!(5.50), IndicatorKind::FedFundsRate),
            record(3, dec!(5.25), IndicatorKind::FedFundsRate),
        ];
        let events = derive_events(&series);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::RateHike);
        assert_eq!(events[1].event_type, EventType::RateCut);
    }

    #[test]
    fn test_mixed_kinds_never_pair_across_kinds() {
        let series = vec![
            record(1, dec!(100), IndicatorKind::Gdp),
            record(2, dec!(5.25), IndicatorKind::FedFundsRate),
        ];
        assert!(derive_events(&series).is_empty());
    }

    #[test]
    fn test_short_series_emit_nothing() {
        assert!(derive_events(&[]).is_empty());
        assert!(derive_events(&[record(1, dec!(100), IndicatorKind::Gdp)]).is_empty());
    }
}
