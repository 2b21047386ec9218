use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::accounts::AccountServiceTrait;
use crate::balances::{AccountBalance, BalanceRepositoryTrait, Period};
use crate::errors::Result;
use crate::fx::{CurrencyConverter, FxError, FxRepositoryTrait};

use super::dashboard_model::{
    DashboardPoint, DashboardRange, DashboardSeries, PeriodAggregate, ReturnMethod,
};
use super::series_calculator::{compute_series, round_amount, select_window};

/// Builds the monthly dashboard series: balances of all accounts rolled into
/// one reporting currency, with net income and returns derived per period.
pub struct DashboardService {
    account_service: Arc<dyn AccountServiceTrait>,
    balance_repository: Arc<dyn BalanceRepositoryTrait>,
    fx_repository: Arc<dyn FxRepositoryTrait>,
}

impl DashboardService {
    pub fn new(
        account_service: Arc<dyn AccountServiceTrait>,
        balance_repository: Arc<dyn BalanceRepositoryTrait>,
        fx_repository: Arc<dyn FxRepositoryTrait>,
    ) -> Self {
        Self {
            account_service,
            balance_repository,
            fx_repository,
        }
    }

    pub fn series(
        &self,
        report_currency: &str,
        range: DashboardRange,
        method: ReturnMethod,
    ) -> Result<DashboardSeries> {
        let currencies = self.account_service.currencies_by_id()?;
        let account_ids: Vec<String> = currencies.keys().cloned().collect();
        let balances = self.balance_repository.find_all(&account_ids)?;

        // The conversion cache lives exactly as long as this computation.
        let mut converter = CurrencyConverter::new(self.fx_repository.clone());
        let aggregates =
            aggregate_periods(&balances, &currencies, report_currency, &mut converter)?;

        let (window, baseline_net_flow) = select_window(&aggregates, range);
        let series = compute_series(window, baseline_net_flow, method);

        let points: Vec<DashboardPoint> = series
            .into_iter()
            .map(|point| DashboardPoint {
                period: point.period,
                inflow: round_amount(point.inflow),
                total_equity: round_amount(point.total_equity),
                net_income: round_amount(point.net_income),
                return_pct: point.return_pct,
            })
            .collect();

        Ok(DashboardSeries {
            currency: report_currency.to_string(),
            range,
            from: points.first().map(|p| p.period),
            to: points.last().map(|p| p.period),
            return_method: method,
            points,
        })
    }
}

/// Rolls balance records into one ascending aggregate per period, converting
/// each record as of the last calendar day of its month. Records that cannot
/// be converted because of a pair gap are skipped; an empty rate store
/// aborts the whole pass.
pub(crate) fn aggregate_periods(
    balances: &[AccountBalance],
    currencies: &HashMap<String, String>,
    report_currency: &str,
    converter: &mut CurrencyConverter,
) -> Result<Vec<PeriodAggregate>> {
    let mut grouped: BTreeMap<Period, PeriodAggregate> = BTreeMap::new();

    for balance in balances {
        let Some(currency) = currencies.get(&balance.account_id) else {
            debug!(
                "Skipping balance {}: account {} has no currency",
                balance.id, balance.account_id
            );
            continue;
        };

        let valuation_date = balance.period().last_day();
        let converted = convert_record(converter, valuation_date, balance, currency, report_currency);
        let (amount, net_flow) = match converted {
            Ok(values) => values,
            Err(FxError::RateNotFound { pair, date }) => {
                warn!(
                    "Skipping balance {}: no rate for {} on {}",
                    balance.id, pair, date
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let entry = grouped
            .entry(balance.period())
            .or_insert_with(|| PeriodAggregate {
                period: balance.period(),
                inflow: Decimal::ZERO,
                total_equity: Decimal::ZERO,
            });
        entry.inflow += net_flow;
        entry.total_equity += amount;
    }

    Ok(grouped.into_values().collect())
}

fn convert_record(
    converter: &mut CurrencyConverter,
    valuation_date: chrono::NaiveDate,
    balance: &AccountBalance,
    currency: &str,
    report_currency: &str,
) -> std::result::Result<(Decimal, Decimal), FxError> {
    let amount = converter.convert(valuation_date, balance.amount, currency, report_currency)?;
    let net_flow = converter.convert(valuation_date, balance.net_flow, currency, report_currency)?;
    Ok((amount, net_flow))
}
