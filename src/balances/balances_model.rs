use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

use super::balances_errors::{BalanceError, Result};
use crate::constants::AMOUNT_DECIMAL_PRECISION;

/// One calendar reporting bucket (year, month). Orders chronologically and
/// renders as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(BalanceError::InvalidData(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Period { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Last calendar day of the month, the valuation date for balances
    /// recorded in this period.
    pub fn last_day(self) -> NaiveDate {
        let first_of_next = self.next().first_day();
        first_of_next.pred_opt().unwrap_or(first_of_next)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Domain model for one account's observed state in one reporting period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub id: String,
    pub account_id: String,
    pub period_year: i32,
    pub period_month: u32,
    pub amount: Decimal,
    pub net_flow: Decimal,
    pub is_closed: bool,
    pub updated_at: NaiveDateTime,
}

impl AccountBalance {
    pub fn period(&self) -> Period {
        Period {
            year: self.period_year,
            month: self.period_month,
        }
    }
}

/// Input model for creating or replacing a balance record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountBalance {
    pub account_id: String,
    pub period_year: i32,
    pub period_month: u32,
    pub amount: Decimal,
    pub net_flow: Decimal,
    pub is_closed: bool,
}

/// One entry of a batch upsert: the caller supplies the period separately
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub account_id: String,
    pub amount: Decimal,
    pub net_flow: Decimal,
}

impl BalanceEntry {
    /// Amount must be non-negative; both fields carry at most two decimal
    /// places. Net flow stays signed so withdrawals can be recorded.
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_sign_negative() {
            return Err(BalanceError::NegativeAmount { field: "amount" });
        }
        validate_precision(self.amount, "amount")?;
        validate_precision(self.net_flow, "netFlow")?;
        Ok(())
    }
}

fn validate_precision(value: Decimal, field: &'static str) -> Result<()> {
    if value.normalize().scale() > AMOUNT_DECIMAL_PRECISION {
        return Err(BalanceError::InvalidDecimalPrecision { field });
    }
    Ok(())
}

/// Per-period roll-up across an account set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub period_year: i32,
    pub period_month: u32,
    pub is_closed: bool,
    pub has_balances: bool,
}

/// Database model for balance records
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::account_balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountBalanceDb {
    pub id: String,
    pub account_id: String,
    pub period_year: i32,
    pub period_month: i32,
    pub amount: String,
    pub net_flow: String,
    pub is_closed: bool,
    pub updated_at: NaiveDateTime,
}

impl From<AccountBalanceDb> for AccountBalance {
    fn from(db: AccountBalanceDb) -> Self {
        AccountBalance {
            id: db.id,
            account_id: db.account_id,
            period_year: db.period_year,
            period_month: db.period_month as u32,
            amount: Decimal::from_str(&db.amount).unwrap_or_default(),
            net_flow: Decimal::from_str(&db.net_flow).unwrap_or_default(),
            is_closed: db.is_closed,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccountBalance> for AccountBalanceDb {
    fn from(domain: NewAccountBalance) -> Self {
        AccountBalanceDb {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: domain.account_id,
            period_year: domain.period_year,
            period_month: domain.period_month as i32,
            amount: domain.amount.to_string(),
            net_flow: domain.net_flow.to_string(),
            is_closed: domain.is_closed,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
