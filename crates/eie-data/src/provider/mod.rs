//! Upstream indicator data sources.

pub mod alpha_vantage;

use async_trait::async_trait;
use eie_core::Ticker;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alpha_vantage::AlphaVantageClient;

/// Source fetch errors.
///
/// `Unavailable` is transient and retryable by re-invocation; `UnknownTicker`
/// is not. Payload problems are provider glitches and treated as transient at
/// the run boundary.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The provider has no series for this ticker
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Transient upstream failure (network, throttle, 5xx)
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The response body did not match any known shape
    #[error("Unrecognized payload: {0}")]
    Payload(String),
}

impl From<SourceError> for eie_core::ExtractError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::UnknownTicker(t) => eie_core::ExtractError::UnknownTicker(t),
            SourceError::Unavailable(msg) => eie_core::ExtractError::SourceUnavailable(msg),
            SourceError::Payload(msg) => {
                eie_core::ExtractError::SourceUnavailable(format!("bad payload: {}", msg))
            }
        }
    }
}

/// One raw observation as delivered by the provider.
///
/// Fields stay optional strings on purpose: malformed entries flow through to
/// the normalizer's skip path instead of failing the fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl RawObservation {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            value: Some(value.into()),
        }
    }
}

/// A read-only, ticker-keyed time-series source.
///
/// Implementations are stateless between calls and keep no local state beyond
/// the connection itself.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Fetch all raw observations for one ticker.
    ///
    /// An empty vector is a valid result (the provider has the series but no
    /// data points).
    async fn fetch(&self, ticker: &Ticker) -> Result<Vec<RawObservation>, SourceError>;
}
