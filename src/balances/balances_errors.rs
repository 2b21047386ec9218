use diesel::result::Error as DieselError;
use thiserror::Error;

use super::balances_model::Period;

/// Custom error type for balance-related operations
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("Period {0} is closed")]
    PeriodClosed(Period),

    #[error("Period {0} is already closed")]
    PeriodAlreadyClosed(Period),

    #[error("No balances recorded for period {0}")]
    NoBalancesForPeriod(Period),

    #[error("{field} must have at most two decimal places")]
    InvalidDecimalPrecision { field: &'static str },

    #[error("{field} must be non-negative")]
    NegativeAmount { field: &'static str },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DieselError> for BalanceError {
    fn from(err: DieselError) -> Self {
        BalanceError::DatabaseError(err.to_string())
    }
}

/// Result type for balance operations
pub type Result<T> = std::result::Result<T, BalanceError>;
