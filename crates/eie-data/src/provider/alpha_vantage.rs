//! Alpha Vantage economic indicator client.
//!
//! Fetches economic time series (GDP, CPI, treasury yields, federal funds
//! rate, ...) from the Alpha Vantage query API. Each ticker maps to one
//! provider function with a fixed default interval.
//!
//! The provider has no stable response schema: most series arrive as
//! `{"name", "interval", "unit", "data": [{"date", "value"}]}`, but older
//! shapes nest the list one level deeper or key a named time-series map by
//! date. Throttle notices arrive as `{"Note"}` or `{"Information"}` bodies
//! with HTTP 200. All known shapes are handled explicitly; anything else is a
//! payload error, never a silent crash.

use async_trait::async_trait;
use eie_core::{IndicatorKind, Ticker};
use std::time::Duration;

use super::{IndicatorSource, RawObservation, SourceError};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const TREASURY_MATURITY: &str = "10year";

/// Alpha Vantage API client.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a non-default endpoint (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Provider function name and default interval for a series.
    fn query_params(kind: IndicatorKind) -> (&'static str, Option<&'static str>) {
        match kind {
            IndicatorKind::Gdp => ("REAL_GDP", Some("quarterly")),
            IndicatorKind::GdpPerCapita => ("REAL_GDP_PER_CAPITA", None),
            IndicatorKind::TreasuryYield => ("TREASURY_YIELD", Some("monthly")),
            IndicatorKind::FedFundsRate => ("FEDERAL_FUNDS_RATE", Some("monthly")),
            IndicatorKind::Cpi => ("CPI", Some("monthly")),
            IndicatorKind::Inflation => ("INFLATION", None),
            IndicatorKind::RetailSales => ("RETAIL_SALES", None),
            IndicatorKind::DurableGoods => ("DURABLES", None),
            IndicatorKind::Unemployment => ("UNEMPLOYMENT", None),
            IndicatorKind::NonfarmPayroll => ("NONFARM_PAYROLL", None),
        }
    }
}

#[async_trait]
impl IndicatorSource for AlphaVantageClient {
    async fn fetch(&self, ticker: &Ticker) -> Result<Vec<RawObservation>, SourceError> {
        let kind = IndicatorKind::from_ticker(ticker.as_str())
            .ok_or_else(|| SourceError::UnknownTicker(ticker.to_string()))?;
        let (function, interval) = Self::query_params(kind);

        let url = format!("{}/query", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("function", function)];
        if let Some(interval) = interval {
            query.push(("interval", interval));
        }
        if kind == IndicatorKind::TreasuryYield {
            query.push(("maturity", TREASURY_MATURITY));
        }
        query.push(("apikey", &self.api_key));

        tracing::debug!(ticker = %ticker, function = function, "Fetching indicator series");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "HTTP {} from provider: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::Payload(format!("invalid JSON body: {}", e)))?;

        let observations = parse_envelope(ticker, &body)?;
        tracing::debug!(
            ticker = %ticker,
            count = observations.len(),
            "Indicator series received"
        );
        Ok(observations)
    }
}

/// Decode a provider response body into raw observations.
///
/// Shapes handled, in order:
/// 1. `{"Error Message": ...}` → unknown ticker
/// 2. `{"Note"|"Information": ...}` → throttled / unavailable
/// 3. `{"data": [...]}` → canonical observation list
/// 4. `{"data": {"data": [...]}}` → nested legacy body
/// 5. A named time-series map keyed by date
pub fn parse_envelope(
    ticker: &Ticker,
    body: &serde_json::Value,
) -> Result<Vec<RawObservation>, SourceError> {
    let object = body
        .as_object()
        .ok_or_else(|| SourceError::Payload("response body is not an object".to_string()))?;

    if object.contains_key("Error Message") {
        return Err(SourceError::UnknownTicker(ticker.to_string()));
    }
    if let Some(note) = object.get("Note").or_else(|| object.get("Information")) {
        return Err(SourceError::Unavailable(format!(
            "provider notice: {}",
            note.as_str().unwrap_or("throttled")
        )));
    }

    if let Some(data) = object.get("data") {
        if let Some(list) = data.as_array() {
            return Ok(list.iter().map(observation_from_entry).collect());
        }
        // Legacy bodies nest the list one level deeper.
        if let Some(list) = data.get("data").and_then(|d| d.as_array()) {
            return Ok(list.iter().map(observation_from_entry).collect());
        }
        if let Some(map) = data.as_object() {
            return Ok(observations_from_series_map(map));
        }
    }

    // Named time-series maps, e.g. {"Monthly Time Series": {"2024-01-01": ...}}.
    for key in ["Monthly Time Series", "Time Series (Monthly)", "series"] {
        if let Some(map) = object.get(key).and_then(|v| v.as_object()) {
            return Ok(observations_from_series_map(map));
        }
    }

    Err(SourceError::Payload(format!(
        "no recognized series in response for {}",
        ticker
    )))
}

/// Convert one `{"date", "value"}` entry, tolerating missing fields.
fn observation_from_entry(entry: &serde_json::Value) -> RawObservation {
    RawObservation {
        date: entry.get("date").and_then(scalar_to_string),
        value: entry.get("value").and_then(scalar_to_string),
    }
}

/// Convert a date-keyed map where each value is either a scalar or an object
/// holding a single usable scalar.
fn observations_from_series_map(
    map: &serde_json::Map<String, serde_json::Value>,
) -> Vec<RawObservation> {
    map.iter()
        .map(|(date, entry)| {
            let value = match entry {
                serde_json::Value::Object(fields) => {
                    fields.values().find_map(scalar_to_string)
                }
                other => scalar_to_string(other),
            };
            RawObservation {
                date: Some(date.clone()),
                value,
            }
        })
        .collect()
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
