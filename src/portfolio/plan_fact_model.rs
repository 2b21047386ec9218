use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balances::Period;
use crate::errors::{Result, ValidationError};

/// Forward projection parameters. `start_date` is optional; resolving its
/// default is the job of `resolve_projection_window`, never of the
/// recurrence itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanScenario {
    pub annual_yield_rate: Decimal,
    pub monthly_inflow: Decimal,
    pub initial_amount: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub currency: String,
}

impl PlanScenario {
    pub fn validate(&self) -> Result<()> {
        if let Some(start) = self.start_date {
            if start > self.end_date {
                return Err(ValidationError::InvalidDateRange(format!(
                    "Scenario start {} is after end {}",
                    start, self.end_date
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// One period of the merged comparison series. Both values are present at
/// the join point where the projection takes over from realized data.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanFactPoint {
    pub period: Period,
    pub fact: Option<Decimal>,
    pub plan: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanFactSeries {
    pub currency: String,
    pub points: Vec<PlanFactPoint>,
}

/// Resolved anchor for the compounding recurrence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionWindow {
    /// Period holding the seed balance; projected values start the month
    /// after.
    pub anchor: Period,
    pub end: Period,
    pub seed_balance: Decimal,
    /// True when the anchor is the last realized period, in which case the
    /// anchor point also carries the seed as its plan value.
    pub anchor_has_fact: bool,
}

/// Explicit defaulting of the projection window: the anchor is the later of
/// the last realized period and the scenario start (falling back to the
/// current month), seeded with the last realized equity when there is one.
pub fn resolve_projection_window(
    scenario: &PlanScenario,
    last_fact: Option<(Period, Decimal)>,
    today: NaiveDate,
) -> ProjectionWindow {
    let end = Period::from_date(scenario.end_date);
    let scenario_start = scenario
        .start_date
        .map(Period::from_date)
        .unwrap_or_else(|| Period::from_date(today));

    match last_fact {
        Some((fact_period, fact_equity)) => {
            let anchor = fact_period.max(scenario_start);
            ProjectionWindow {
                anchor,
                end,
                seed_balance: fact_equity,
                anchor_has_fact: anchor == fact_period,
            }
        }
        None => ProjectionWindow {
            anchor: scenario_start,
            end,
            seed_balance: scenario.initial_amount,
            anchor_has_fact: false,
        },
    }
}
