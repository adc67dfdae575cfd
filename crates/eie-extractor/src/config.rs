//! Environment-based configuration.

use eie_core::ExtractError;
use std::time::Duration;

/// Extractor configuration, injected into the source client and the store at
/// construction. Nothing here is read from ambient global state after load.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Database URL
    pub database_url: String,
    /// Upstream source settings
    pub source: SourceConfig,
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Daemon mode settings
    pub daemon: DaemonConfig,
}

/// Upstream source settings.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Provider API key
    pub api_key: String,
    /// Provider endpoint override (tests, proxies)
    pub base_url: Option<String>,
    /// Delay between upstream requests (rate budget), milliseconds
    pub request_delay_ms: u64,
    /// Per-ticker fetch timeout, seconds
    pub fetch_timeout_secs: u64,
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tickers processed in parallel; 1 means sequential
    pub concurrency: usize,
}

/// Daemon mode settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Workflow interval, minutes
    pub interval_minutes: u64,
}

impl ExtractorConfig {
    /// Load the configuration from environment variables.
    pub fn from_env() -> Result<Self, ExtractError> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ExtractError::Config("DATABASE_URL is not set".to_string()))?;
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .map_err(|_| ExtractError::Config("ALPHAVANTAGE_API_KEY is not set".to_string()))?;

        Ok(Self {
            database_url,
            source: SourceConfig {
                api_key,
                base_url: std::env::var("ALPHAVANTAGE_BASE_URL").ok(),
                request_delay_ms: env_var_parse("SOURCE_REQUEST_DELAY_MS", 500),
                fetch_timeout_secs: env_var_parse("SOURCE_FETCH_TIMEOUT_SECS", 30),
            },
            pipeline: PipelineConfig {
                concurrency: env_var_parse("PIPELINE_CONCURRENCY", 1),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 60),
            },
        })
    }
}

impl SourceConfig {
    /// Delay between upstream requests as a Duration.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Per-ticker fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl DaemonConfig {
    /// Workflow interval as a Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// Parse an environment variable, falling back to a default.
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
