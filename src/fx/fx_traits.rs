use chrono::NaiveDate;

use super::fx_errors::Result;
use super::fx_model::{CurrencyRate, NewCurrencyRate};

/// Trait defining the contract for currency rate store operations.
pub trait FxRepositoryTrait: Send + Sync {
    fn find_exact(&self, date: NaiveDate, base: &str, target: &str)
        -> Result<Option<CurrencyRate>>;
    fn find_latest_on_or_before(
        &self,
        date: NaiveDate,
        base: &str,
        target: &str,
    ) -> Result<Option<CurrencyRate>>;
    fn find_latest(&self) -> Result<Option<CurrencyRate>>;
    /// Existence probe distinguishing "never synced" from "pair is gapped".
    fn has_any(&self) -> Result<bool>;
    fn find_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: Option<&str>,
    ) -> Result<Vec<CurrencyRate>>;
    fn upsert(&self, rate: NewCurrencyRate) -> Result<CurrencyRate>;
}
