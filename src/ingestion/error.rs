//! Error types for every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure class, used when reporting a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Retrieval,
    DataShape,
    Io,
    Query,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Retrieval => write!(f, "retrieval"),
            ErrorKind::DataShape => write!(f, "data shape"),
            ErrorKind::Io => write!(f, "I/O"),
            ErrorKind::Query => write!(f, "query"),
            ErrorKind::Config => write!(f, "configuration"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request to {url} failed: {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid CSS selector `{0}`")]
    Selector(String),

    #[error("no <table> element found in page")]
    MissingTable,

    #[error("table row {row} has {found} data cells, expected {expected}")]
    ColumnCount {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("column `{0}` not present in table")]
    MissingColumn(String),

    #[error("invalid market cap value {value:?} in row {row}")]
    InvalidAmount { row: usize, value: String },

    #[error("market cap in row {row} overflows when converted to {currency}")]
    AmountOverflow { row: usize, currency: String },

    #[error("invalid exchange rate {value:?} for {currency}")]
    InvalidRate { currency: String, value: String },

    #[error("exchange rate for {0} listed more than once")]
    DuplicateRate(String),

    #[error("no exchange rate for currency {0}")]
    MissingRate(String),

    #[error("failed to read exchange rates from {path:?}: {source}")]
    ReadRates {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write CSV to {path:?}: {source}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("query `{query}` failed: {source}")]
    Query {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("unexpected input: {0}")]
    UnexpectedInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Fetch { .. } | EtlError::HttpStatus { .. } => ErrorKind::Retrieval,
            EtlError::Selector(_)
            | EtlError::MissingTable
            | EtlError::ColumnCount { .. }
            | EtlError::MissingColumn(_)
            | EtlError::InvalidAmount { .. }
            | EtlError::AmountOverflow { .. }
            | EtlError::InvalidRate { .. }
            | EtlError::DuplicateRate(_)
            | EtlError::MissingRate(_)
            | EtlError::UnexpectedInput(_) => ErrorKind::DataShape,
            EtlError::ReadRates { .. }
            | EtlError::WriteCsv { .. }
            | EtlError::Io { .. }
            | EtlError::Store(_) => ErrorKind::Io,
            EtlError::Query { .. } => ErrorKind::Query,
            EtlError::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EtlError::MissingTable.kind(), ErrorKind::DataShape);
        assert_eq!(EtlError::MissingRate("INR".to_string()).kind(), ErrorKind::DataShape);
        assert_eq!(
            EtlError::Query {
                query: "SELECT".to_string(),
                source: sqlx::Error::RowNotFound,
            }
            .kind(),
            ErrorKind::Query
        );
        assert_eq!(EtlError::Store(sqlx::Error::PoolClosed).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_messages() {
        let err = EtlError::ColumnCount {
            row: 2,
            found: 4,
            expected: 3,
        };
        assert_eq!(err.to_string(), "table row 2 has 4 data cells, expected 3");

        let err = EtlError::InvalidAmount {
            row: 0,
            value: "n/a".to_string(),
        };
        assert_eq!(err.to_string(), "invalid market cap value \"n/a\" in row 0");
    }
}
