use async_trait::async_trait;
use chrono::NaiveDate;

use crate::fx::fx_errors::Result;
use crate::fx::fx_model::NewCurrencyRate;

/// External source of daily exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Rates to store for `date`. Implementations may read a bulletin
    /// published on a nearby day but must report the requested date.
    async fn daily_rates(&self, date: NaiveDate) -> Result<Vec<NewCurrencyRate>>;
}
