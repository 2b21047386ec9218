use chrono::{Duration, NaiveDate, Utc};
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::fx_errors::{FxError, Result};
use super::fx_model::{CurrencyPair, CurrencyRate, NewCurrencyRate};
use super::fx_traits::FxRepositoryTrait;

/// Default listing window when the caller gives no range.
const DEFAULT_LISTING_DAYS: i64 = 30;

/// Resolves the exchange rate for a pair on a date. Resolution order, first
/// match wins: same currency, exact, exact inverse, latest on or before the
/// date, latest inverse on or before the date. A miss distinguishes an empty
/// store (`RatesUnavailable`) from a gap for this pair (`RateNotFound`).
pub fn resolve_rate(
    repository: &dyn FxRepositoryTrait,
    date: NaiveDate,
    from: &str,
    to: &str,
) -> Result<Decimal> {
    if from == to {
        return Ok(Decimal::ONE);
    }

    if let Some(direct) = repository.find_exact(date, from, to)? {
        return Ok(direct.rate);
    }

    if let Some(inverse) = repository.find_exact(date, to, from)? {
        if !inverse.rate.is_zero() {
            return Ok(Decimal::ONE / inverse.rate);
        }
    }

    // Weekends, holidays and future dates hold the last known rate.
    if let Some(latest) = repository.find_latest_on_or_before(date, from, to)? {
        warn!(
            "No exchange rate for {}/{} on {}, holding rate from {}",
            from, to, date, latest.date
        );
        return Ok(latest.rate);
    }

    if let Some(latest_inverse) = repository.find_latest_on_or_before(date, to, from)? {
        if !latest_inverse.rate.is_zero() {
            warn!(
                "No exchange rate for {}/{} on {}, holding inverse rate from {}",
                from, to, date, latest_inverse.date
            );
            return Ok(Decimal::ONE / latest_inverse.rate);
        }
    }

    if !repository.has_any()? {
        return Err(FxError::RatesUnavailable);
    }

    Err(FxError::RateNotFound {
        pair: CurrencyPair::new(from, to),
        date,
    })
}

/// Converts amounts through the rate store, memoizing each resolved
/// `(date, pair)` for its own lifetime. One converter serves exactly one
/// logical computation and is dropped with it, so nothing leaks across
/// requests.
pub struct CurrencyConverter {
    repository: Arc<dyn FxRepositoryTrait>,
    cache: HashMap<(NaiveDate, CurrencyPair), Decimal>,
}

impl CurrencyConverter {
    pub fn new(repository: Arc<dyn FxRepositoryTrait>) -> Self {
        Self {
            repository,
            cache: HashMap::new(),
        }
    }

    pub fn rate(&mut self, date: NaiveDate, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let key = (date, CurrencyPair::new(from, to));
        if let Some(rate) = self.cache.get(&key) {
            return Ok(*rate);
        }

        let rate = resolve_rate(self.repository.as_ref(), date, from, to)?;
        self.cache.insert(key, rate);
        Ok(rate)
    }

    pub fn convert(
        &mut self,
        date: NaiveDate,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        let rate = self.rate(date, from, to)?;
        Ok(amount * rate)
    }
}

/// Service facade over the currency rate store
pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
}

impl FxService {
    pub fn new(repository: Arc<dyn FxRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub fn add_rate(&self, new_rate: NewCurrencyRate) -> Result<CurrencyRate> {
        new_rate.validate()?;
        self.repository.upsert(new_rate)
    }

    pub fn get_rate_for_date(&self, date: NaiveDate, from: &str, to: &str) -> Result<Decimal> {
        resolve_rate(self.repository.as_ref(), date, from, to)
    }

    pub fn convert_for_date(
        &self,
        date: NaiveDate,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        let rate = self.get_rate_for_date(date, from, to)?;
        Ok(amount * rate)
    }

    /// Fresh conversion cache for one logical computation.
    pub fn converter(&self) -> CurrencyConverter {
        CurrencyConverter::new(self.repository.clone())
    }

    pub fn get_rates(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        base: Option<&str>,
    ) -> Result<Vec<CurrencyRate>> {
        let today = Utc::now().date_naive();
        let effective_end = end.unwrap_or(today);
        let effective_start =
            start.unwrap_or_else(|| effective_end - Duration::days(DEFAULT_LISTING_DAYS));

        if effective_start > effective_end {
            return Err(FxError::InvalidDateRange(format!(
                "{} is after {}",
                effective_start, effective_end
            )));
        }

        self.repository
            .find_between(effective_start, effective_end, base)
    }
}
