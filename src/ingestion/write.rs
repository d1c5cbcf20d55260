//! Write functions - persist the bank table to CSV and SQLite

use crate::ingestion::error::EtlError;
use crate::ingestion::types::{BankRecord, BankTable, WriteStats};
use crate::ingestion::utils::{quote_identifier, require_sql_identifier};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use tracing::{debug, info};

/// Write the table to CSV with a leading row-index column, replacing the file
pub fn write_csv(table: &BankTable, path: &Path) -> Result<WriteStats, EtlError> {
    info!("Writing {} records to {:?}", table.len(), path);

    let csv_err = |source| EtlError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    let mut header = vec![String::new()];
    header.extend(table.columns());
    writer.write_record(&header).map_err(csv_err)?;

    for (idx, record) in table.records.iter().enumerate() {
        let mut fields = vec![idx.to_string()];
        fields.extend(record_fields(record));
        writer.write_record(&fields).map_err(csv_err)?;
    }

    writer.flush().map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let stats = WriteStats {
        rows: table.len(),
        columns: header.len(),
    };
    info!("CSV write complete: {}", stats);

    Ok(stats)
}

fn record_fields(record: &BankRecord) -> Vec<String> {
    let mut fields = vec![
        record.rank.clone(),
        record.bank_name.clone(),
        record.mc_usd_billion.to_string(),
    ];
    fields.extend(record.converted.iter().map(|c| c.amount.to_string()));
    fields
}

/// Open (creating if missing) the SQLite database file
pub async fn open_store(path: &Path) -> Result<SqliteConnection, EtlError> {
    info!("Opening SQLite database {:?}", path);

    let conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await?;

    Ok(conn)
}

/// Replace `table_name` with the contents of `table` (schema and data).
/// Runs in one transaction so a failed load leaves the previous table intact.
pub async fn write_table(
    conn: &mut SqliteConnection,
    table_name: &str,
    table: &BankTable,
) -> Result<WriteStats, EtlError> {
    require_sql_identifier(table_name)?;

    info!("Writing {} records to table {}", table.len(), table_name);

    let columns = table.columns();
    let column_defs = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            // Rank and Bank_name stay text, every market cap column is numeric
            let sql_type = if idx < 2 { "TEXT" } else { "REAL" };
            format!("{} {}", quote_identifier(name), sql_type)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");

    let drop_sql = format!("DROP TABLE IF EXISTS {}", table_name);
    let create_sql = format!("CREATE TABLE {} ({})", table_name, column_defs);
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name, column_list, placeholders
    );

    let mut tx = conn.begin().await?;

    sqlx::query(&drop_sql).execute(&mut *tx).await?;
    sqlx::query(&create_sql).execute(&mut *tx).await?;
    debug!("Created table: {}", create_sql);

    for (row, record) in table.records.iter().enumerate() {
        let mut query = sqlx::query(&insert_sql)
            .bind(&record.rank)
            .bind(&record.bank_name)
            .bind(to_real(row, record.mc_usd_billion)?);
        for converted in &record.converted {
            query = query.bind(to_real(row, converted.amount)?);
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    let stats = WriteStats {
        rows: table.len(),
        columns: columns.len(),
    };
    info!("Table write complete: {}", stats);

    Ok(stats)
}

fn to_real(row: usize, value: Decimal) -> Result<f64, EtlError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EtlError::InvalidAmount {
            row,
            value: value.to_string(),
        })
}

/// Number of rows currently stored in `table_name`
pub async fn count_rows(conn: &mut SqliteConnection, table_name: &str) -> Result<i64, EtlError> {
    require_sql_identifier(table_name)?;

    let query = format!("SELECT COUNT(*) FROM {}", table_name);
    let result = sqlx::query_scalar::<_, i64>(&query)
        .fetch_one(&mut *conn)
        .await;

    match result {
        Ok(count) => Ok(count),
        Err(source) => Err(EtlError::Query { query, source }),
    }
}
