//! Parse functions - turn raw inputs into tables

use crate::ingestion::error::EtlError;
use crate::ingestion::types::{ExchangeRates, RawData, RecordTable};
use crate::ingestion::utils::selector;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info};

/// Exchange-rate CSV row structure
#[derive(Debug, Deserialize)]
struct ExchangeRateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: String, // parsed to Decimal ourselves to keep the exact digits
}

/// Parse the first `<table>` of the page into a table with `table_attribs` columns.
///
/// Rows without `<td>` cells (header rows) are skipped. Cells are assigned to
/// columns by position; a row whose cell count differs from
/// `table_attribs.len()` is rejected.
pub fn parse_first_table(raw: &RawData, table_attribs: &[&str]) -> Result<RecordTable, EtlError> {
    let html = raw.as_html()?;
    info!("Parsing first table from page ({} bytes)", html.len());

    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or(EtlError::MissingTable)?;

    let mut records = RecordTable::new(table_attribs);

    for row in table.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }

        if cells.len() != table_attribs.len() {
            return Err(EtlError::ColumnCount {
                row: records.len(),
                found: cells.len(),
                expected: table_attribs.len(),
            });
        }

        debug!("Extracted row {}: {:?}", records.len(), cells);
        records.rows.push(cells);
    }

    info!("Parsed {} rows from first table", records.len());

    Ok(records)
}

/// Cell text with every text node trimmed and blank nodes dropped
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse the exchange-rate CSV (`Currency`, `Rate` columns)
pub fn parse_exchange_rates(raw: &RawData) -> Result<ExchangeRates, EtlError> {
    let path = raw.as_file_path()?;
    info!("Parsing exchange rates from {:?}", path);

    let read_err = |source| EtlError::ReadRates {
        path: path.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let mut pairs = Vec::new();
    for result in reader.deserialize::<ExchangeRateRow>() {
        let row = result.map_err(read_err)?;
        let rate = Decimal::from_str(&row.rate).map_err(|_| EtlError::InvalidRate {
            currency: row.currency.clone(),
            value: row.rate.clone(),
        })?;
        pairs.push((row.currency, rate));
    }

    let rates = ExchangeRates::from_pairs(pairs)?;
    info!("Loaded {} exchange rates", rates.len());

    Ok(rates)
}
