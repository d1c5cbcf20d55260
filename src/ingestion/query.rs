//! Query runner - execute literal SQL against the store and render the result set

use crate::ingestion::error::EtlError;
use crate::ingestion::types::{market_cap_column, BANK_NAME_COLUMN};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use std::fmt;
use tracing::info;

/// A single result cell, typed by SQLite's runtime storage class
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(usize),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "None"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(v) => write!(f, "{}", v),
            Cell::Blob(len) => write!(f, "<{} bytes>", len),
        }
    }
}

/// Fully materialized result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}

/// Indexed text table: header line, then one line per row prefixed by its index
impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "Empty result\nColumns: [{}]", self.columns.join(", "));
        }

        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();

        let index_width = (self.rows.len() - 1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                rendered
                    .iter()
                    .filter_map(|r| r.get(idx))
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:width$}", "", width = index_width)?;
        for (name, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", name, width = width)?;
        }

        for (idx, row) in rendered.iter().enumerate() {
            write!(f, "\n{:<width$}", idx, width = index_width)?;
            for (value, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", value, width = width)?;
            }
        }

        Ok(())
    }
}

/// The three queries of the reference workflow
pub fn reference_queries(table_name: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {}", table_name),
        format!("SELECT AVG({}) FROM {}", market_cap_column("GBP"), table_name),
        format!("SELECT {} FROM {} LIMIT 5", BANK_NAME_COLUMN, table_name),
    ]
}

/// Execute `query` and materialize every row
pub async fn run_query(conn: &mut SqliteConnection, query: &str) -> Result<QueryOutput, EtlError> {
    info!("Running query: {}", query);

    let rows = sqlx::query(query)
        .fetch_all(&mut *conn)
        .await
        .map_err(|source| EtlError::Query {
            query: query.to_string(),
            source,
        })?;

    let mut output = QueryOutput::default();

    output.columns = match rows.first() {
        Some(first) => first.columns().iter().map(|c| c.name().to_string()).collect(),
        // No row to read names from; ask SQLite for the statement's columns
        None => (&mut *conn)
            .describe(query)
            .await
            .map_err(|source| EtlError::Query {
                query: query.to_string(),
                source,
            })?
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
    };

    for row in &rows {
        let cells = (0..row.len())
            .map(|idx| decode_cell(row, idx))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| EtlError::Query {
                query: query.to_string(),
                source,
            })?;
        output.rows.push(cells);
    }

    info!("Query returned {} rows", output.len());

    Ok(output)
}

fn decode_cell(row: &SqliteRow, idx: usize) -> Result<Cell, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Cell::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let cell = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Cell::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" | "NUMERIC" => Cell::Real(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => Cell::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?.len()),
        _ => Cell::Text(row.try_get_unchecked::<String, _>(idx)?),
    };

    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::types::{BankRecord, BankTable, ConvertedAmount};
    use crate::ingestion::write::{open_store, write_table};
    use rust_decimal::Decimal;
    use tempfile::{tempdir, TempDir};

    async fn loaded_store(count: usize) -> (TempDir, SqliteConnection) {
        let temp = tempdir().unwrap();
        let mut conn = open_store(&temp.path().join("banks.db")).await.unwrap();

        let records = (1..=count)
            .map(|rank| BankRecord {
                rank: rank.to_string(),
                bank_name: format!("Bank {}", rank),
                mc_usd_billion: Decimal::from(rank as i64 * 10),
                converted: vec![ConvertedAmount {
                    currency: "GBP".to_string(),
                    amount: Decimal::from(rank as i64 * 8),
                }],
            })
            .collect();
        let table = BankTable {
            currencies: vec!["GBP".to_string()],
            records,
        };
        write_table(&mut conn, "banks", &table).await.unwrap();

        (temp, conn)
    }

    #[tokio::test]
    async fn test_first_five_bank_names() {
        let (_temp, mut conn) = loaded_store(10).await;

        let query = &reference_queries("banks")[2];
        let output = run_query(&mut conn, query).await.unwrap();

        assert_eq!(output.columns, vec!["Bank_name"]);
        let names: Vec<String> = output.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(names, vec!["Bank 1", "Bank 2", "Bank 3", "Bank 4", "Bank 5"]);
    }

    #[tokio::test]
    async fn test_average_gbp() {
        let (_temp, mut conn) = loaded_store(4).await;

        let query = &reference_queries("banks")[1];
        let output = run_query(&mut conn, query).await.unwrap();

        assert_eq!(output.len(), 1);
        match &output.rows[0][0] {
            Cell::Real(avg) => assert!((avg - 20.0).abs() < 1e-9), // (8+16+24+32)/4
            other => panic!("Expected Real, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_select_all() {
        let (_temp, mut conn) = loaded_store(3).await;

        let output = run_query(&mut conn, "SELECT * FROM banks").await.unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(
            output.columns,
            vec!["Rank", "Bank_name", "MC_USD_Billion", "MC_GBP_Billion"]
        );
        assert_eq!(output.rows[0][0], Cell::Text("1".to_string()));
        let usd = output.column("MC_USD_Billion").unwrap();
        assert_eq!(usd[2], &Cell::Real(30.0));
    }

    #[tokio::test]
    async fn test_empty_table_keeps_columns() {
        let (_temp, mut conn) = loaded_store(0).await;

        let output = run_query(&mut conn, "SELECT * FROM banks").await.unwrap();

        assert!(output.is_empty());
        assert_eq!(
            output.columns,
            vec!["Rank", "Bank_name", "MC_USD_Billion", "MC_GBP_Billion"]
        );
        assert_eq!(
            output.to_string(),
            "Empty result\nColumns: [Rank, Bank_name, MC_USD_Billion, MC_GBP_Billion]"
        );
    }

    #[tokio::test]
    async fn test_missing_table() {
        let (_temp, mut conn) = loaded_store(1).await;

        let result = run_query(&mut conn, "SELECT * FROM nope").await;
        assert!(matches!(result, Err(EtlError::Query { .. })));
    }

    #[tokio::test]
    async fn test_invalid_query() {
        let (_temp, mut conn) = loaded_store(1).await;

        let result = run_query(&mut conn, "SELEKT banks").await;
        assert!(matches!(result, Err(EtlError::Query { .. })));
    }

    #[test]
    fn test_render_output() {
        let output = QueryOutput {
            columns: vec!["Bank_name".to_string()],
            rows: vec![
                vec![Cell::Text("JPMorgan Chase".to_string())],
                vec![Cell::Text("Bank of America".to_string())],
            ],
        };

        assert_eq!(
            output.to_string(),
            "         Bank_name\n0   JPMorgan Chase\n1  Bank of America"
        );
    }

    #[test]
    fn test_render_empty() {
        let output = QueryOutput::default();
        assert_eq!(output.to_string(), "Empty result\nColumns: []");
    }
}
