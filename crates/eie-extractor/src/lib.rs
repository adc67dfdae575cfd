//! Extraction-and-upsert pipeline for economic indicator time series.
//!
//! This crate provides the pipeline orchestrator: it accepts a ticker list,
//! drives fetch → normalize → derive → upsert per ticker, aggregates counts
//! and per-ticker failures, and returns a single run summary to the caller.

pub mod config;
pub mod pipeline;
pub mod stats;

pub use config::ExtractorConfig;
pub use pipeline::{ExtractOptions, Extractor, DEFAULT_TICKERS};
pub use stats::RunStats;
