use chrono::{Duration, NaiveDate, Utc};
use log::{error, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::RATE_DECIMAL_PRECISION;
use crate::utils::time_utils::get_days_between;

use super::fx_errors::{FxError, Result};
use super::fx_model::{CurrencyPair, CurrencyRate, NewCurrencyRate};
use super::fx_traits::FxRepositoryTrait;
use super::providers::RateProvider;

/// Tolerance when comparing a stored cross rate against a re-derived one.
const CROSS_RATE_EPSILON: Decimal = dec!(0.000001);

/// Policy for the daily rate backfill.
#[derive(Debug, Clone)]
pub struct RateSyncConfig {
    pub base_currencies: Vec<String>,
    pub target_currency: String,
    /// No rates are fetched for days before this date.
    pub min_sync_date: NaiveDate,
    /// Upper bound on a single backfill span, in days.
    pub max_span_days: i64,
    /// How far behind the latest stored rate a routine sync may reach.
    pub max_lookback_days: i64,
}

impl Default for RateSyncConfig {
    fn default() -> Self {
        Self {
            base_currencies: vec!["USD".to_string(), "EUR".to_string()],
            target_currency: "RUB".to_string(),
            min_sync_date: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
            max_span_days: 1830,
            max_lookback_days: 5,
        }
    }
}

impl RateSyncConfig {
    /// Pairs a fully synced day must carry: every base against the target,
    /// plus the EUR/USD cross when both bases are tracked.
    pub fn required_pairs(&self) -> Vec<CurrencyPair> {
        let mut pairs: Vec<CurrencyPair> = self
            .base_currencies
            .iter()
            .map(|base| CurrencyPair::new(base, &self.target_currency))
            .collect();
        if let Some(cross) = self.cross_pair() {
            pairs.push(cross);
        }
        pairs
    }

    fn cross_pair(&self) -> Option<CurrencyPair> {
        let has_eur = self.base_currencies.iter().any(|c| c == "EUR");
        let has_usd = self.base_currencies.iter().any(|c| c == "USD");
        (has_eur && has_usd).then(|| CurrencyPair::new("EUR", "USD"))
    }
}

/// Outcome of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub days_processed: usize,
    pub days_skipped: usize,
    pub days_failed: usize,
    pub rates_stored: usize,
}

/// Background synchronization of daily currency rates from an external
/// provider. A failure on one day never blocks the following days.
pub struct RateSyncService {
    repository: Arc<dyn FxRepositoryTrait>,
    provider: Arc<dyn RateProvider>,
    config: RateSyncConfig,
}

enum DayOutcome {
    Skipped,
    Stored(usize),
}

impl RateSyncService {
    pub fn new(
        repository: Arc<dyn FxRepositoryTrait>,
        provider: Arc<dyn RateProvider>,
        config: RateSyncConfig,
    ) -> Self {
        Self {
            repository,
            provider,
            config,
        }
    }

    /// Backfills every missing day between `start` and `end` inclusive.
    pub async fn sync_range(&self, start: NaiveDate, end: NaiveDate) -> Result<SyncSummary> {
        if start > end {
            return Err(FxError::InvalidDateRange(format!(
                "{} is after {}",
                start, end
            )));
        }
        let span = (end - start).num_days();
        if span > self.config.max_span_days {
            return Err(FxError::InvalidDateRange(format!(
                "Range of {} days exceeds the maximum of {}",
                span, self.config.max_span_days
            )));
        }

        let mut summary = SyncSummary::default();
        for day in get_days_between(start, end) {
            match self.sync_day(day).await {
                Ok(DayOutcome::Skipped) => summary.days_skipped += 1,
                Ok(DayOutcome::Stored(count)) => {
                    summary.days_processed += 1;
                    summary.rates_stored += count;
                }
                Err(e) => {
                    error!("Currency rate sync failed for {}: {}", day, e);
                    summary.days_failed += 1;
                }
            }
        }

        info!(
            "Rate sync {}..{}: {} fetched, {} skipped, {} failed",
            start, end, summary.days_processed, summary.days_skipped, summary.days_failed
        );
        Ok(summary)
    }

    /// Resumes the backfill from the day after the latest stored rate,
    /// clamped to the configured lookback window.
    pub async fn sync_missing(&self) -> Result<SyncSummary> {
        self.sync_missing_as_of(Utc::now().date_naive()).await
    }

    pub async fn sync_missing_as_of(&self, today: NaiveDate) -> Result<SyncSummary> {
        let latest_date = self
            .repository
            .find_latest()?
            .map(|rate| rate.date)
            .unwrap_or(self.config.min_sync_date);
        let max_lookback = today - Duration::days(self.config.max_lookback_days - 1);

        let start = if latest_date > max_lookback {
            latest_date + Duration::days(1)
        } else {
            max_lookback.max(self.config.min_sync_date)
        };

        if start > today {
            return Ok(SyncSummary::default());
        }

        self.sync_range(start, today).await
    }

    async fn sync_day(&self, day: NaiveDate) -> Result<DayOutcome> {
        let existing: HashSet<CurrencyPair> = self
            .repository
            .find_between(day, day, None)?
            .iter()
            .map(CurrencyRate::pair)
            .collect();

        let all_present = self
            .config
            .required_pairs()
            .iter()
            .all(|pair| existing.contains(pair));
        if all_present {
            return Ok(DayOutcome::Skipped);
        }

        let rates = self.provider.daily_rates(day).await?;
        if rates.is_empty() {
            warn!(
                "Provider {} returned no rates for {}",
                self.provider.source_name(),
                day
            );
        }

        let mut stored = 0;
        for rate in rates {
            self.repository.upsert(rate)?;
            stored += 1;
        }
        Ok(DayOutcome::Stored(stored))
    }

    /// Re-derives the EUR/USD cross from the stored per-base rates and
    /// repairs days where it is missing or has drifted.
    pub fn derive_cross_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let Some(cross) = self.config.cross_pair() else {
            return Ok(0);
        };

        let rates = self.repository.find_between(start, end, None)?;
        let mut by_date: HashMap<NaiveDate, Vec<&CurrencyRate>> = HashMap::new();
        for rate in &rates {
            by_date.entry(rate.date).or_default().push(rate);
        }

        let target = &self.config.target_currency;
        let mut derived_count = 0;

        for (date, entries) in by_date {
            let base_to_target = |base: &str| {
                entries
                    .iter()
                    .find(|r| r.base_currency == base && r.target_currency == *target)
            };
            let (Some(eur), Some(usd)) = (base_to_target("EUR"), base_to_target("USD")) else {
                continue;
            };
            if usd.rate.is_zero() {
                continue;
            }

            let derived = (eur.rate / usd.rate).round_dp(RATE_DECIMAL_PRECISION);
            let current = entries
                .iter()
                .find(|r| r.base_currency == cross.base && r.target_currency == cross.target);

            let needs_store = match current {
                None => true,
                Some(existing) => (existing.rate - derived).abs() > CROSS_RATE_EPSILON,
            };
            if needs_store {
                self.repository.upsert(NewCurrencyRate {
                    date,
                    base_currency: cross.base.clone(),
                    target_currency: cross.target.clone(),
                    rate: derived,
                    source: "derived".to_string(),
                })?;
                derived_count += 1;
            }
        }

        Ok(derived_count)
    }
}
