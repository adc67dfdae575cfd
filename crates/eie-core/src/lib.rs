//! Core domain models and types for the economic indicator extractor.
//!
//! This crate provides:
//! - Domain types (tickers, indicator records, derived events, run summaries)
//! - The error taxonomy shared across the pipeline
//! - Logging infrastructure built on `tracing`

pub mod error;
pub mod logging;
pub mod types;

pub use error::{ExtractError, Result};
pub use types::event::{EventRecord, EventType};
pub use types::indicator::{IndicatorKind, IndicatorRecord, VALUE_SCALE};
pub use types::summary::{RunSummary, TickerFailure};
pub use types::ticker::{parse_ticker_list, Ticker};
