//! Transform functions - coerce market cap and derive converted columns

use crate::convert_currency;
use crate::ingestion::error::EtlError;
use crate::ingestion::fetch::fetch_exchange_rates;
use crate::ingestion::parse::parse_exchange_rates;
use crate::ingestion::types::{
    BankRecord, BankTable, ConvertedAmount, ExchangeRates, RecordTable, BANK_NAME_COLUMN,
    MARKET_CAP_COLUMN, RANK_COLUMN,
};
use crate::ingestion::utils::parse_amount;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info};

/// Load the exchange-rate file and convert every row into `targets`
pub fn transform(
    table: &RecordTable,
    exchange_rate_path: &Path,
    targets: &[String],
) -> Result<BankTable, EtlError> {
    let raw = fetch_exchange_rates(exchange_rate_path)?;
    let rates = parse_exchange_rates(&raw)?;

    convert_table(table, &rates, targets)
}

/// Convert an extracted table with an already loaded rate mapping.
/// Pure function - the same inputs always produce the same table.
pub fn convert_table(
    table: &RecordTable,
    rates: &ExchangeRates,
    targets: &[String],
) -> Result<BankTable, EtlError> {
    info!(
        "Transforming {} rows into {} currencies",
        table.len(),
        targets.len()
    );

    // Resolve every rate up front so a missing currency fails before any row work
    let target_rates = targets
        .iter()
        .map(|currency| Ok((currency.clone(), rates.rate(currency)?)))
        .collect::<Result<Vec<(String, Decimal)>, EtlError>>()?;

    let rank_idx = table.column_index(RANK_COLUMN)?;
    let name_idx = table.column_index(BANK_NAME_COLUMN)?;
    let cap_idx = table.column_index(MARKET_CAP_COLUMN)?;

    let mut records = Vec::with_capacity(table.len());

    for (row_idx, row) in table.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or_default();

        let raw_cap = cell(cap_idx);
        let mc_usd_billion = parse_amount(raw_cap).ok_or_else(|| EtlError::InvalidAmount {
            row: row_idx,
            value: raw_cap.to_string(),
        })?;

        let record = BankRecord {
            rank: cell(rank_idx).to_string(),
            bank_name: cell(name_idx).to_string(),
            mc_usd_billion,
            converted: convert_amount(row_idx, mc_usd_billion, &target_rates)?,
        };

        debug!("Converted {}: {:?}", record.bank_name, record.converted);
        records.push(record);
    }

    info!("Transformation complete: {} records", records.len());

    Ok(BankTable {
        currencies: targets.to_vec(),
        records,
    })
}

/// Derive one converted amount per target rate, in target order
pub fn convert_amount(
    row: usize,
    base: Decimal,
    target_rates: &[(String, Decimal)],
) -> Result<Vec<ConvertedAmount>, EtlError> {
    target_rates
        .iter()
        .map(|(currency, rate)| {
            let amount =
                convert_currency(base, *rate).ok_or_else(|| EtlError::AmountOverflow {
                    row,
                    currency: currency.clone(),
                })?;
            Ok(ConvertedAmount {
                currency: currency.clone(),
                amount,
            })
        })
        .collect()
}
