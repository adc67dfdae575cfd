//! Calendar events derived from indicator series.

use crate::types::indicator::IndicatorKind;
use crate::types::ticker::Ticker;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of derived event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Value moved relative to the prior observation
    ValueChange,
    /// Rate series moved up
    RateHike,
    /// Rate series moved down
    RateCut,
}

impl EventType {
    /// Classify a value change for the given series.
    ///
    /// `delta` is new minus previous and is never zero here; equal
    /// neighbouring observations produce no event at all.
    pub fn classify(kind: IndicatorKind, delta: Decimal) -> Self {
        if kind.is_rate() {
            if delta.is_sign_positive() {
                Self::RateHike
            } else {
                Self::RateCut
            }
        } else {
            Self::ValueChange
        }
    }

    /// Canonical storage string for the natural key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueChange => "value_change",
            Self::RateHike => "rate_hike",
            Self::RateCut => "rate_cut",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived, timestamped occurrence computed from an indicator series.
///
/// Natural key: `(ticker, occurred_on, event_type)`. The `kind` plus
/// `occurred_on` reference the observation the event was derived from; the
/// previous and new values ride along as a JSON notes payload in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Row identity, assigned at derivation time
    pub id: Uuid,
    pub ticker: Ticker,
    pub occurred_on: NaiveDate,
    pub event_type: EventType,
    /// Series the event was derived from
    pub kind: IndicatorKind,
    pub previous_value: Decimal,
    pub new_value: Decimal,
}

impl EventRecord {
    /// Detail payload stored in the event notes column.
    pub fn notes(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind.as_str(),
            "previous_value": self.previous_value.to_string(),
            "new_value": self.new_value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_classify_rate_direction() {
        assert_eq!(
            EventType::classify(IndicatorKind::FedFundsRate, dec!(0.25)),
            EventType::RateHike
        );
        assert_eq!(
            EventType::classify(IndicatorKind::TreasuryYield, dec!(-0.10)),
            EventType::RateCut
        );
        assert_eq!(
            EventType::classify(IndicatorKind::Gdp, dec!(-12.0)),
            EventType::ValueChange
        );
    }

    #[test]
    fn test_notes_payload() {
        let event = EventRecord {
            id: Uuid::nil(),
            ticker: Ticker::new("CPI").unwrap(),
            occurred_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            event_type: EventType::ValueChange,
            kind: IndicatorKind::Cpi,
            previous_value: dec!(100.0000),
            new_value: dec!(105.0000),
        };
        let notes = event.notes();
        assert_eq!(notes["kind"], "CPI");
        assert_eq!(notes["new_value"], "105.0000");
    }
}
