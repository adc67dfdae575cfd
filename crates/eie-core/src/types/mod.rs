//! Domain types for the extraction pipeline.

pub mod event;
pub mod indicator;
pub mod summary;
pub mod ticker;

pub use event::{EventRecord, EventType};
pub use indicator::{IndicatorKind, IndicatorRecord, VALUE_SCALE};
pub use summary::{RunSummary, TickerFailure};
pub use ticker::{parse_ticker_list, Ticker};
