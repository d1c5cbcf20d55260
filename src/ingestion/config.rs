//! Pipeline configuration with fixed defaults and optional environment overrides

use crate::ingestion::error::EtlError;
use crate::ingestion::utils::require_sql_identifier;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SOURCE_URL: &str = "https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_EXCHANGE_RATE_PATH: &str = "./exchange_rate.csv";
pub const DEFAULT_CSV_PATH: &str = "./largest_bank.csv";
pub const DEFAULT_DATABASE_PATH: &str = "Largest_banks.db";
pub const DEFAULT_TABLE_NAME: &str = "banks";
pub const DEFAULT_LOG_PATH: &str = "./etl_banks_project_log.txt";
pub const DEFAULT_TARGET_CURRENCIES: [&str; 3] = ["GBP", "EUR", "INR"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source_url: String,
    pub exchange_rate_path: PathBuf,
    pub csv_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub target_currencies: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            exchange_rate_path: DEFAULT_EXCHANGE_RATE_PATH.into(),
            csv_path: DEFAULT_CSV_PATH.into(),
            database_path: DEFAULT_DATABASE_PATH.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: DEFAULT_LOG_PATH.into(),
            target_currencies: DEFAULT_TARGET_CURRENCIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and overlay environment variables on the defaults
    pub fn from_env() -> Result<Self, EtlError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let target_currencies = match lookup("TARGET_CURRENCIES") {
            Some(list) => parse_currency_list(&list),
            None => defaults.target_currencies,
        };

        let config = Config {
            source_url: lookup("SOURCE_URL").unwrap_or(defaults.source_url),
            exchange_rate_path: lookup("EXCHANGE_RATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.exchange_rate_path),
            csv_path: lookup("CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.csv_path),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            table_name: lookup("TABLE_NAME").unwrap_or(defaults.table_name),
            log_path: lookup("LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
            target_currencies,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EtlError> {
        require_sql_identifier(&self.table_name)?;

        if self.target_currencies.is_empty() {
            return Err(EtlError::Config(
                "at least one target currency is required".to_string(),
            ));
        }

        // Currency codes end up inside column names
        if let Some(bad) = self
            .target_currencies
            .iter()
            .find(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric()))
        {
            return Err(EtlError::Config(format!("invalid currency code {:?}", bad)));
        }

        Ok(())
    }
}

fn parse_currency_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}
