// Module declarations
pub(crate) mod balances_errors;
pub(crate) mod balances_model;
pub(crate) mod balances_repository;
pub(crate) mod balances_service;
pub(crate) mod balances_traits;

// Re-export the public interface
pub use balances_model::{
    AccountBalance, BalanceEntry, NewAccountBalance, Period, PeriodSummary,
};
pub use balances_repository::BalanceRepository;
pub use balances_service::BalanceService;
pub use balances_traits::{BalanceRepositoryTrait, BalanceServiceTrait};

// Re-export error types for convenience
pub use balances_errors::{BalanceError, Result};
