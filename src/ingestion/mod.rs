//! Data ingestion module - linear pipeline for the largest-banks table

pub mod config;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod transform;
pub mod types;
pub mod utils;
pub mod write;

pub use config::Config;
pub use error::{ErrorKind, EtlError};
pub use types::*;
