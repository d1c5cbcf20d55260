//! Utility functions for common operations

use crate::ingestion::error::EtlError;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::Selector;
use std::str::FromStr;
use tracing::info;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Download a page via HTTP and return its body as text
pub async fn http_get(url: &str) -> Result<String, EtlError> {
    info!("Downloading from {}", url);
    let fetch_err = |source| EtlError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(fetch_err)?;

    let response = client.get(url).send().await.map_err(fetch_err)?;
    let status = response.status();

    if !status.is_success() {
        return Err(EtlError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await.map_err(fetch_err)?;
    info!("Downloaded {} bytes", body.len());
    Ok(body)
}

/// Compile a CSS selector
pub fn selector(css: &str) -> Result<Selector, EtlError> {
    Selector::parse(css).map_err(|_| EtlError::Selector(css.to_string()))
}

/// Parse a numeric cell that may carry thousands separators ("1,234.5")
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let clean = text.replace(',', "");
    Decimal::from_str(clean.trim()).ok()
}

/// True for names safe to splice into SQL unquoted (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Reject table names that cannot be spliced into SQL as-is
pub fn require_sql_identifier(name: &str) -> Result<(), EtlError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(EtlError::Config(format!(
            "table name {:?} is not a plain SQL identifier",
            name
        )))
    }
}

/// Double-quote an identifier for SQLite
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("432.92"), Some(Decimal::new(43292, 2)));
        assert_eq!(parse_amount("1,234.5"), Some(Decimal::new(12345, 1)));
        assert_eq!(parse_amount(" 2,000 "), Some(Decimal::from(2000)));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_is_sql_identifier() {
        assert!(is_sql_identifier("banks"));
        assert!(is_sql_identifier("_top_10"));
        assert!(!is_sql_identifier("10banks"));
        assert!(!is_sql_identifier("banks x"));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn test_require_sql_identifier() {
        assert!(require_sql_identifier("banks").is_ok());
        assert!(matches!(
            require_sql_identifier("banks; DROP TABLE banks"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Bank_name"), "\"Bank_name\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_selector() {
        assert!(selector("table").is_ok());
        assert!(matches!(selector("td[["), Err(EtlError::Selector(_))));
    }
}
