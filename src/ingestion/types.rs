//! Core data types for the ingestion pipeline
//! Tables, rate lookup and column naming shared by every stage

use crate::ingestion::error::EtlError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const RANK_COLUMN: &str = "Rank";
pub const BANK_NAME_COLUMN: &str = "Bank_name";
pub const MARKET_CAP_COLUMN: &str = "MC_USD_Billion";

/// Expected columns of the source table, in positional order
pub const TABLE_ATTRIBS: [&str; 3] = [RANK_COLUMN, BANK_NAME_COLUMN, MARKET_CAP_COLUMN];

/// Column name holding market cap converted into `currency`
pub fn market_cap_column(currency: &str) -> String {
    format!("MC_{}_Billion", currency)
}

/// Raw data from the two pipeline inputs - tagged unions
#[derive(Debug)]
pub enum RawData {
    Html(String),
    File(PathBuf),
}

impl RawData {
    pub fn as_html(&self) -> Result<&str, EtlError> {
        match self {
            RawData::Html(html) => Ok(html),
            _ => Err(EtlError::UnexpectedInput(format!("expected Html, got {:?}", self))),
        }
    }

    pub fn as_file_path(&self) -> Result<&PathBuf, EtlError> {
        match self {
            RawData::File(path) => Ok(path),
            _ => Err(EtlError::UnexpectedInput(format!("expected File, got {:?}", self))),
        }
    }
}

/// Text table as extracted from the page, cells assigned positionally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn new(columns: &[&str]) -> Self {
        RecordTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Result<usize, EtlError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| EtlError::MissingColumn(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Currency code -> rate against USD; immutable after load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRates {
    rates: BTreeMap<String, Decimal>,
}

impl ExchangeRates {
    pub fn from_pairs<I>(pairs: I) -> Result<Self, EtlError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut rates = BTreeMap::new();
        for (currency, rate) in pairs {
            if rates.insert(currency.clone(), rate).is_some() {
                return Err(EtlError::DuplicateRate(currency));
            }
        }
        Ok(ExchangeRates { rates })
    }

    pub fn rate(&self, currency: &str) -> Result<Decimal, EtlError> {
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| EtlError::MissingRate(currency.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Market cap converted into one target currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedAmount {
    pub currency: String,
    pub amount: Decimal,
}

/// Bank record after transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRecord {
    pub rank: String,
    pub bank_name: String,
    pub mc_usd_billion: Decimal,
    pub converted: Vec<ConvertedAmount>,
}

/// Transformed table; `currencies` fixes the order of the derived columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankTable {
    pub currencies: Vec<String>,
    pub records: Vec<BankRecord>,
}

impl BankTable {
    /// Column names in output order (no row index)
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = TABLE_ATTRIBS.iter().map(|c| c.to_string()).collect();
        columns.extend(self.currencies.iter().map(|c| market_cap_column(c)));
        columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Write operation statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    pub rows: usize,
    pub columns: usize,
}

impl std::fmt::Display for WriteStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rows: {}, columns: {}", self.rows, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_cap_column() {
        assert_eq!(market_cap_column("GBP"), "MC_GBP_Billion");
    }

    #[test]
    fn test_bank_table_columns() {
        let table = BankTable {
            currencies: vec!["GBP".to_string(), "EUR".to_string(), "INR".to_string()],
            records: Vec::new(),
        };

        assert_eq!(
            table.columns(),
            vec![
                "Rank",
                "Bank_name",
                "MC_USD_Billion",
                "MC_GBP_Billion",
                "MC_EUR_Billion",
                "MC_INR_Billion"
            ]
        );
    }

    #[test]
    fn test_exchange_rates_rejects_duplicates() {
        let result = ExchangeRates::from_pairs(vec![
            ("GBP".to_string(), Decimal::new(8, 1)),
            ("GBP".to_string(), Decimal::new(9, 1)),
        ]);

        assert!(matches!(result, Err(EtlError::DuplicateRate(c)) if c == "GBP"));
    }

    #[test]
    fn test_exchange_rates_missing_currency() {
        let rates = ExchangeRates::from_pairs(vec![("EUR".to_string(), Decimal::new(93, 2))]).unwrap();

        assert_eq!(rates.rate("EUR").unwrap(), Decimal::new(93, 2));
        assert!(matches!(rates.rate("INR"), Err(EtlError::MissingRate(c)) if c == "INR"));
    }

    #[test]
    fn test_raw_data_accessors() {
        let raw = RawData::Html("<table></table>".to_string());
        assert_eq!(raw.as_html().unwrap(), "<table></table>");
        assert!(raw.as_file_path().is_err());
    }
}
