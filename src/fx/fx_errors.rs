use chrono::NaiveDate;
use diesel::result::Error as DieselError;
use thiserror::Error;

use super::fx_model::CurrencyPair;

#[derive(Debug, Error)]
pub enum FxError {
    /// The rate store holds no rows at all; rates were never synced.
    #[error("Currency rates are not available")]
    RatesUnavailable,

    /// The store has data, but none usable for this pair and date.
    #[error("No exchange rate found for {pair} on {date}")]
    RateNotFound { pair: CurrencyPair, date: NaiveDate },

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Invalid currency pair: {0}")]
    InvalidCurrencyPair(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Fetch error: {0}")]
    FetchFailed(String),

    #[error("Parsing error: {0}")]
    ParseFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for FxError {
    fn from(err: DieselError) -> Self {
        FxError::DatabaseError(err.to_string())
    }
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        FxError::FetchFailed(err.to_string())
    }
}

/// Result type for FX operations
pub type Result<T> = std::result::Result<T, FxError>;
