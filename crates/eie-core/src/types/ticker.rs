//! Ticker identifier for a tracked economic series.

use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};

/// Identifier for one tracked economic series (e.g. "REAL_GDP", "CPI").
///
/// Caller-supplied, normalized to uppercase. Construction rejects empty or
/// whitespace-only input; everything else is validated against the known
/// indicator catalog later, at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Create a ticker from caller input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ExtractError::InvalidInput(
                "ticker must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// The normalized ticker string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a caller-supplied ticker list from its JSON boundary form.
///
/// The invocation interface accepts either a JSON array of strings or a
/// JSON-encoded string containing such an array. Anything else (null, a
/// non-array value, non-string or empty elements) is `InvalidInput` and must
/// fail the run before any I/O.
pub fn parse_ticker_list(value: &serde_json::Value) -> Result<Vec<Ticker>> {
    let parsed: serde_json::Value = match value {
        serde_json::Value::String(s) => serde_json::from_str(s).map_err(|e| {
            ExtractError::InvalidInput(format!("tickers_list is not valid JSON: {}", e))
        })?,
        other => other.clone(),
    };

    let items = parsed.as_array().ok_or_else(|| {
        ExtractError::InvalidInput("tickers_list must be a list of strings".to_string())
    })?;

    items
        .iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ticker::new(s),
            other => Err(ExtractError::InvalidInput(format!(
                "tickers_list element is not a string: {}",
                other
            ))),
        })
        .collect()
}
