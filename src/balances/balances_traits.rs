use super::balances_errors::Result;
use super::balances_model::{AccountBalance, BalanceEntry, NewAccountBalance, Period, PeriodSummary};

/// Trait defining the contract for balance repository operations.
pub trait BalanceRepositoryTrait: Send + Sync {
    fn upsert(&self, balance: NewAccountBalance) -> Result<AccountBalance>;
    fn find_for_period(&self, account_ids: &[String], period: Period) -> Result<Vec<AccountBalance>>;
    fn find_all(&self, account_ids: &[String]) -> Result<Vec<AccountBalance>>;
    fn is_period_closed(&self, account_ids: &[String], period: Period) -> Result<bool>;
    /// Marks every record of `period` closed and inserts the rollover seeds,
    /// all in one transaction. Seeds hitting an existing row are ignored.
    fn close_period_with_rollover(
        &self,
        account_ids: &[String],
        period: Period,
        seeds: Vec<NewAccountBalance>,
    ) -> Result<usize>;
}

/// Trait defining the contract for balance service operations.
pub trait BalanceServiceTrait: Send + Sync {
    fn upsert_batch(
        &self,
        period: Period,
        entries: Vec<BalanceEntry>,
    ) -> crate::errors::Result<Vec<AccountBalance>>;
    fn get_balances(&self, period: Period) -> crate::errors::Result<Vec<AccountBalance>>;
    fn close_month(&self, period: Period) -> crate::errors::Result<usize>;
    fn get_period_summary(&self, period: Period) -> crate::errors::Result<PeriodSummary>;
    fn list_period_summaries(&self) -> crate::errors::Result<Vec<PeriodSummary>>;
}
