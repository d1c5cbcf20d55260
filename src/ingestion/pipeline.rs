//! Pipeline orchestration - extract, transform, load, query in strict sequence

use crate::ingestion::config::Config;
use crate::ingestion::error::EtlError;
use crate::ingestion::progress::ProgressLog;
use crate::ingestion::query::{reference_queries, run_query, QueryOutput};
use crate::ingestion::types::{BankTable, RawData, WriteStats, TABLE_ATTRIBS};
use crate::ingestion::{fetch, parse, transform, write};
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;
use tracing::info;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub rows_extracted: usize,
    pub csv: WriteStats,
    pub store: WriteStats,
    pub queries: Vec<(String, QueryOutput)>,
}

/// Run the whole pipeline, fetching the page from `config.source_url`
pub async fn run(config: &Config, progress: &ProgressLog) -> Result<PipelineReport, EtlError> {
    config.validate()?;
    progress.log("Preliminaries complete. Initiating ETL process");

    let page = fetch::fetch_page(&config.source_url).await?;

    run_from_page(config, progress, page).await
}

/// Run every stage after the fetch, starting from an already retrieved page
pub async fn run_from_page(
    config: &Config,
    progress: &ProgressLog,
    page: RawData,
) -> Result<PipelineReport, EtlError> {
    info!("Step 1/4: Extracting table...");
    let extracted = parse::parse_first_table(&page, &TABLE_ATTRIBS)?;
    progress.log("Data extraction complete. Initiating Transformation process");

    info!("Step 2/4: Transforming...");
    let banks = transform::transform(
        &extracted,
        &config.exchange_rate_path,
        &config.target_currencies,
    )?;
    progress.log("Data transformation complete. Initiating loading process");

    info!("Step 3/4: Loading...");
    let csv = write::write_csv(&banks, &config.csv_path)?;
    progress.log("Data saved to CSV file");

    let mut conn = write::open_store(&config.database_path).await?;
    progress.log("SQL Connection initiated.");

    let loaded = load_and_query(&mut conn, config, progress, &banks).await;

    // Release the connection on both paths; a close error only matters on success
    let closed = conn.close().await;
    let (store, queries) = loaded?;
    closed?;
    progress.log("Server Connection closed.");

    Ok(PipelineReport {
        rows_extracted: extracted.len(),
        csv,
        store,
        queries,
    })
}

async fn load_and_query(
    conn: &mut SqliteConnection,
    config: &Config,
    progress: &ProgressLog,
    banks: &BankTable,
) -> Result<(WriteStats, Vec<(String, QueryOutput)>), EtlError> {
    let store = write::write_table(conn, &config.table_name, banks).await?;
    progress.log("Data loaded to Database as table. Running the query");

    info!("Step 4/4: Running queries...");
    let mut queries = Vec::new();
    for query in reference_queries(&config.table_name) {
        println!("{}", query);
        let output = run_query(conn, &query).await?;
        println!("{}", output);
        queries.push((query, output));
    }

    Ok((store, queries))
}
