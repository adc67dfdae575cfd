//! Standalone extractor CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use eie_core::logging::{init_logging, LogConfig};
use eie_data::{AlphaVantageClient, PgIndicatorStore};
use eie_extractor::{ExtractOptions, Extractor, ExtractorConfig, DEFAULT_TICKERS};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "eie-extractor")]
#[command(about = "Economic indicator extraction pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction pass and print the run summary as JSON
    Extract {
        /// Restrict to specific tickers (comma separated, e.g. "CPI,REAL_GDP")
        #[arg(long)]
        tickers: Option<String>,
    },

    /// Daemon mode: run the extraction workflow on an interval
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG still wins inside init_logging; the flag only sets the default.
    let mut log_config = LogConfig::from_env();
    log_config.level = format!("eie_extractor={0},eie_data={0}", cli.log_level);
    init_logging(log_config)?;

    tracing::info!("Economic indicator extractor starting");

    let config = ExtractorConfig::from_env()?;
    tracing::debug!(concurrency = config.pipeline.concurrency, "Configuration loaded");

    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    let source = match &config.source.base_url {
        Some(base_url) => AlphaVantageClient::with_base_url(&config.source.api_key, base_url),
        None => AlphaVantageClient::new(&config.source.api_key),
    };
    let store = PgIndicatorStore::new(pool.clone());
    let extractor = Extractor::new(
        Arc::new(source),
        Arc::new(store),
        ExtractOptions::from(&config),
    );

    match cli.command {
        Commands::Extract { tickers } => {
            let tickers = resolve_tickers(tickers);
            let summary = extractor.run(&tickers).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.success {
                pool.close().await;
                return Err(summary
                    .error
                    .unwrap_or_else(|| "extraction run failed".to_string())
                    .into());
            }
        }
        Commands::Daemon => {
            tracing::info!(
                interval_minutes = config.daemon.interval_minutes,
                "Daemon mode starting"
            );

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Shutdown signal received, stopping after current ticker");
                        cancel.cancel();
                    }
                });
            }

            let tickers = resolve_tickers(None);
            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        break;
                    }
                    _ = interval.tick() => {
                        let summary = extractor.run_with_cancel(&tickers, cancel.clone()).await;
                        if summary.success {
                            tracing::info!(message = %summary.message, "Workflow pass completed");
                        } else {
                            tracing::error!(
                                error = summary.error.as_deref().unwrap_or("unknown"),
                                "Workflow pass failed"
                            );
                        }
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!(
                            "Next pass in {} minutes",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    pool.close().await;
    tracing::info!("Economic indicator extractor stopped");

    Ok(())
}

/// Comma-separated override, or the full catalog.
fn resolve_tickers(arg: Option<String>) -> Vec<String> {
    match arg {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
    }
}
