use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balances::Period;

/// Display window for a dashboard series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DashboardRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "ytd")]
    Ytd,
}

/// Return methodology, selected per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReturnMethod {
    #[default]
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "twr")]
    TimeWeighted,
    #[serde(rename = "mwr")]
    MoneyWeighted,
}

/// Raw per-period roll-up in the reporting currency, before performance
/// figures are derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodAggregate {
    pub period: Period,
    pub inflow: Decimal,
    pub total_equity: Decimal,
}

/// One period of the computed series, unrounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub period: Period,
    pub inflow: Decimal,
    pub total_equity: Decimal,
    pub net_income: Decimal,
    pub return_pct: Option<Decimal>,
}

/// One presentation-ready dashboard point
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPoint {
    pub period: Period,
    pub inflow: Decimal,
    pub total_equity: Decimal,
    pub net_income: Decimal,
    pub return_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSeries {
    pub currency: String,
    pub range: DashboardRange,
    pub from: Option<Period>,
    pub to: Option<Period>,
    pub return_method: ReturnMethod,
    pub points: Vec<DashboardPoint>,
}
