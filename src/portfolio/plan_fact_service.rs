use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::accounts::AccountServiceTrait;
use crate::balances::{AccountBalance, BalanceRepositoryTrait, Period};
use crate::errors::Result;
use crate::fx::{CurrencyConverter, FxRepositoryTrait};

use super::dashboard_service::aggregate_periods;
use super::plan_fact_model::{resolve_projection_window, PlanFactPoint, PlanFactSeries, PlanScenario};
use super::series_calculator::round_amount;

/// Blends realized monthly equity with a forward compounding projection
/// into one comparison series.
pub struct PlanFactService {
    account_service: Arc<dyn AccountServiceTrait>,
    balance_repository: Arc<dyn BalanceRepositoryTrait>,
    fx_repository: Arc<dyn FxRepositoryTrait>,
}

impl PlanFactService {
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

    /// `today` is passed in by the caller so defaulting stays deterministic
    /// and testable.
    pub fn series(&self, scenario: &PlanScenario, today: NaiveDate) -> Result<PlanFactSeries> {
        scenario.validate()?;

        let currencies = self.account_service.currencies_by_id()?;
        let account_ids: Vec<String> = currencies.keys().cloned().collect();
        let current_period = Period::from_date(today);

        // Future periods hold provisional user input and stay out of the
        // realized side.
        let balances: Vec<AccountBalance> = self
            .balance_repository
            .find_all(&account_ids)?
            .into_iter()
            .filter(|balance| balance.period() <= current_period)
            .collect();

        let mut converter = CurrencyConverter::new(self.fx_repository.clone());
        let aggregates =
            aggregate_periods(&balances, &currencies, &scenario.currency, &mut converter)?;

        let mut points: BTreeMap<Period, PlanFactPoint> = aggregates
            .iter()
            .map(|aggregate| {
                (
                    aggregate.period,
                    PlanFactPoint {
                        period: aggregate.period,
                        fact: Some(round_amount(aggregate.total_equity)),
                        plan: None,
                    },
                )
            })
            .collect();

        let last_fact = aggregates
            .last()
            .map(|aggregate| (aggregate.period, aggregate.total_equity));
        let window = resolve_projection_window(scenario, last_fact, today);

        if window.anchor_has_fact && window.anchor <= window.end {
            if let Some(point) = points.get_mut(&window.anchor) {
                point.plan = Some(round_amount(window.seed_balance));
            }
        }

        let monthly_rate = scenario.annual_yield_rate / dec!(12);
        let mut balance = window.seed_balance;
        let mut cursor = window.anchor.next();
        while cursor <= window.end {
            balance = balance * (Decimal::ONE + monthly_rate) + scenario.monthly_inflow;
            points
                .entry(cursor)
                .or_insert_with(|| PlanFactPoint {
                    period: cursor,
                    fact: None,
                    plan: None,
                })
                .plan = Some(round_amount(balance));
            cursor = cursor.next();
        }

        Ok(PlanFactSeries {
            currency: scenario.currency.clone(),
            points: points.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::balances_service::tests::{MockAccountService, MockBalanceRepository};
    use crate::errors::Error;
    use crate::fx::fx_service::tests::MockFxRepository;
    use rust_decimal_macros::dec;

    fn balance(account_id: &str, year: i32, month: u32, amount: Decimal) -> AccountBalance {
        AccountBalance {
            id: format!("{}-{}-{}", account_id, year, month),
            account_id: account_id.to_string(),
            period_year: year,
            period_month: month,
            amount,
            net_flow: Decimal::ZERO,
            is_closed: false,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn plan_fact(balances: Vec<AccountBalance>) -> PlanFactService {
        PlanFactService::new(
            Arc::new(MockAccountService::new(vec![("a1", "RUB", true)])),
            Arc::new(MockBalanceRepository::with_records(balances)),
            Arc::new(MockFxRepository::empty()),
        )
    }

    fn scenario(end_year: i32, end_month: u32, end_day: u32) -> PlanScenario {
        PlanScenario {
            annual_yield_rate: dec!(0.12),
            monthly_inflow: dec!(1000),
            initial_amount: dec!(0),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(end_year, end_month, end_day).unwrap(),
            currency: "RUB".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_projection_without_realized_data() {
        let service = plan_fact(vec![]);

        // One month forward: 0 * (1 + 0.01) + 1000
        let series = service.series(&scenario(2024, 7, 31), today()).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].period, Period::new(2024, 7).unwrap());
        assert_eq!(series.points[0].fact, None);
        assert_eq!(series.points[0].plan, Some(dec!(1000.00)));
    }

    #[test]
    fn test_projection_compounds_monthly() {
        let service = plan_fact(vec![]);
        let series = service.series(&scenario(2024, 8, 31), today()).unwrap();

        assert_eq!(series.points.len(), 2);
        // 1000 * 1.01 + 1000
        assert_eq!(series.points[1].plan, Some(dec!(2010.00)));
    }

    #[test]
    fn test_join_period_carries_fact_and_plan() {
        let service = plan_fact(vec![
            balance("a1", 2024, 5, dec!(4000)),
            balance("a1", 2024, 6, dec!(5000)),
        ]);

        let series = service.series(&scenario(2024, 8, 31), today()).unwrap();

        let join = series
            .points
            .iter()
            .find(|p| p.period == Period::new(2024, 6).unwrap())
            .unwrap();
        assert_eq!(join.fact, Some(dec!(5000.00)));
        assert_eq!(join.plan, Some(dec!(5000.00)));

        // The projection continues from the realized equity.
        let july = series
            .points
            .iter()
            .find(|p| p.period == Period::new(2024, 7).unwrap())
            .unwrap();
        assert_eq!(july.fact, None);
        assert_eq!(july.plan, Some(dec!(6050.00))); // 5000 * 1.01 + 1000
    }

    #[test]
    fn test_future_balances_stay_out_of_facts() {
        let service = plan_fact(vec![
            balance("a1", 2024, 6, dec!(5000)),
            balance("a1", 2024, 9, dec!(9999)),
        ]);

        let series = service.series(&scenario(2024, 7, 31), today()).unwrap();
        assert!(series
            .points
            .iter()
            .all(|p| p.period != Period::new(2024, 9).unwrap() || p.fact.is_none()));
        // September is past the scenario end, so it only appears if realized
        // data put it there; the fact side must not include it at all.
        assert_eq!(
            series
                .points
                .iter()
                .filter(|p| p.fact.is_some())
                .count(),
            1
        );
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let service = plan_fact(vec![]);
        let mut bad = scenario(2024, 7, 31);
        bad.start_date = Some(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());

        let result = service.series(&bad, today());
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_projection_ends_inclusively_at_end_date() {
        let service = plan_fact(vec![]);
        let series = service.series(&scenario(2024, 12, 1), today()).unwrap();
        let last = series.points.last().unwrap();
        assert_eq!(last.period, Period::new(2024, 12).unwrap());
    }
}
