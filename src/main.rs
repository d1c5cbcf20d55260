//! Largest-banks ETL - scrape, convert, load to CSV + SQLite, run reference queries

use anyhow::{Context, Result};
use bank_etl::ingestion::pipeline;
use bank_etl::ingestion::progress::ProgressLog;
use bank_etl::ingestion::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("🏦 Starting largest-banks ETL");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded: {:?}", config);

    let progress = ProgressLog::new(&config.log_path);

    match pipeline::run(&config, &progress).await {
        Ok(report) => {
            info!(
                "✅ ETL complete: {} rows extracted, CSV {}, table {} ({})",
                report.rows_extracted, report.csv, config.table_name, report.store
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ ETL failed ({} error): {}", e.kind(), e);
            Err(e).context("ETL run failed")
        }
    }
}
