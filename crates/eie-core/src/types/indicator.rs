//! Normalized indicator observations.

use crate::types::ticker::Ticker;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed fractional scale for normalized indicator values.
///
/// Every stored value is rescaled to this precision so that re-running on
/// unchanged upstream data yields byte-identical rows.
pub const VALUE_SCALE: u32 = 4;

/// The economic series an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorKind {
    Gdp,
    GdpPerCapita,
    TreasuryYield,
    FedFundsRate,
    Cpi,
    Inflation,
    RetailSales,
    DurableGoods,
    Unemployment,
    NonfarmPayroll,
}

impl IndicatorKind {
    /// Resolve a caller ticker against the indicator catalog.
    ///
    /// Accepts both the provider function names and the short aliases the
    /// callers historically used. Returns `None` for anything unmapped, which
    /// the pipeline reports as an unknown ticker.
    pub fn from_ticker(ticker: &str) -> Option<Self> {
        match ticker {
            "GDP" | "REAL_GDP" => Some(Self::Gdp),
            "GDP_PER_CAPITA" | "REAL_GDP_PER_CAPITA" => Some(Self::GdpPerCapita),
            "TREASURY_YIELD" => Some(Self::TreasuryYield),
            "FED_FUNDS_RATE" | "FEDERAL_FUNDS_RATE" => Some(Self::FedFundsRate),
            "CPI" => Some(Self::Cpi),
            "INFLATION" => Some(Self::Inflation),
            "RETAIL_SALES" => Some(Self::RetailSales),
            "DURABLES" | "DURABLE_GOODS" => Some(Self::DurableGoods),
            "UNEMPLOYMENT" => Some(Self::Unemployment),
            "NONFARM_PAYROLL" | "NONFARM_PAYROLLS" => Some(Self::NonfarmPayroll),
            _ => None,
        }
    }

    /// Canonical storage string for the natural key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gdp => "GDP",
            Self::GdpPerCapita => "GDP_PER_CAPITA",
            Self::TreasuryYield => "TREASURY_YIELD",
            Self::FedFundsRate => "FED_FUNDS_RATE",
            Self::Cpi => "CPI",
            Self::Inflation => "INFLATION",
            Self::RetailSales => "RETAIL_SALES",
            Self::DurableGoods => "DURABLE_GOODS",
            Self::Unemployment => "UNEMPLOYMENT",
            Self::NonfarmPayroll => "NONFARM_PAYROLL",
        }
    }

    /// Whether this series is an interest-rate style series.
    ///
    /// Rate series get directional hike/cut events instead of plain value
    /// changes.
    pub fn is_rate(&self) -> bool {
        matches!(self, Self::TreasuryYield | Self::FedFundsRate)
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized, timestamped observation for a ticker.
///
/// Natural key: `(ticker, observed_on, kind)`. Re-extraction must never
/// produce a second row for the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub ticker: Ticker,
    pub observed_on: NaiveDate,
    pub value: Decimal,
    pub kind: IndicatorKind,
}

impl IndicatorRecord {
    /// Build a record, rescaling the value to the fixed precision.
    pub fn new(ticker: Ticker, observed_on: NaiveDate, mut value: Decimal, kind: IndicatorKind) -> Self {
        value.rescale(VALUE_SCALE);
        Self {
            ticker,
            observed_on,
            value,
            kind,
        }
    }
}
