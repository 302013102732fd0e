//! Core data types for percentile records and lookup outcomes.

use serde::{Deserialize, Serialize};

use crate::code::StockCode;

/// A row as projected from the `stocks` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub stock_code: String,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub pe_percentile_3y: Option<f64>,
}

impl StockRow {
    pub fn new(stock_code: &str, stock_name: Option<&str>, pe_percentile_3y: Option<f64>) -> Self {
        Self {
            stock_code: stock_code.to_string(),
            stock_name: stock_name.map(|s| s.to_string()),
            pe_percentile_3y,
        }
    }
}

/// The stored percentile for one stock.
///
/// `percentile` is `None` when the row exists but the field is empty, which
/// is a different situation from the row not existing at all.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRecord {
    pub code: StockCode,
    pub name: Option<String>,
    pub percentile: Option<f64>,
}

/// Result of a percentile lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(PercentileRecord),
    NotFound,
    /// The store could not be queried. Carries the error detail for logging.
    UpstreamFailure(String),
}

/// Errors raised by a [`crate::store::StockStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
