//! Data acquisition and storage for the indicator extraction pipeline.
//!
//! This crate provides:
//! - The upstream source client and raw payload model
//! - The indicator normalizer (raw observations → canonical records)
//! - The event deriver (per-ticker series → calendar events)
//! - The idempotent Postgres upsert store

pub mod derive;
pub mod normalize;
pub mod provider;
pub mod storage;

pub use derive::{dedup_series, derive_events};
pub use normalize::{normalize_series, NormalizedSeries};
pub use provider::{AlphaVantageClient, IndicatorSource, RawObservation, SourceError};
pub use storage::{IndicatorStore, PgIndicatorStore, UpsertOutcome};
