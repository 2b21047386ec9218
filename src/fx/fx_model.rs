use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fx_errors::{FxError, Result};

/// An ordered currency pair: 1 unit of `base` = rate units of `target`.
/// Used as a structured lookup key so differently assembled strings can
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(base: &str, target: &str) -> Self {
        CurrencyPair {
            base: base.to_string(),
            target: target.to_string(),
        }
    }

    pub fn inverted(&self) -> Self {
        CurrencyPair {
            base: self.target.clone(),
            target: self.base.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

/// Domain model for one stored daily exchange rate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub id: String,
    pub date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: Decimal,
    pub source: String,
    pub fetched_at: NaiveDateTime,
}

impl CurrencyRate {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.base_currency, &self.target_currency)
    }
}

/// Input model for storing a rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCurrencyRate {
    pub date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: Decimal,
    pub source: String,
}

impl NewCurrencyRate {
    pub fn validate(&self) -> Result<()> {
        if self.base_currency == self.target_currency {
            return Err(FxError::InvalidCurrencyPair(format!(
                "{}/{}",
                self.base_currency, self.target_currency
            )));
        }
        if self.rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Rate for {}/{} must be positive, got {}",
                self.base_currency, self.target_currency, self.rate
            )));
        }
        Ok(())
    }
}

/// Database model for currency rates
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::currency_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrencyRateDb {
    pub id: String,
    pub date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: String,
    pub source: String,
    pub fetched_at: NaiveDateTime,
}

impl From<CurrencyRateDb> for CurrencyRate {
    fn from(db: CurrencyRateDb) -> Self {
        CurrencyRate {
            id: db.id,
            date: db.date,
            base_currency: db.base_currency,
            target_currency: db.target_currency,
            rate: Decimal::from_str(&db.rate).unwrap_or_default(),
            source: db.source,
            fetched_at: db.fetched_at,
        }
    }
}

impl From<NewCurrencyRate> for CurrencyRateDb {
    fn from(domain: NewCurrencyRate) -> Self {
        CurrencyRateDb {
            id: uuid::Uuid::new_v4().to_string(),
            date: domain.date,
            base_currency: domain.base_currency,
            target_currency: domain.target_currency,
            rate: domain.rate.to_string(),
            source: domain.source,
            fetched_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_display_and_inversion() {
        let pair = CurrencyPair::new("USD", "RUB");
        assert_eq!(pair.to_string(), "USD/RUB");
        assert_eq!(pair.inverted(), CurrencyPair::new("RUB", "USD"));
    }

    #[test]
    fn test_new_rate_rejects_self_pair() {
        let rate = NewCurrencyRate {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            base_currency: "USD".to_string(),
            target_currency: "USD".to_string(),
            rate: dec!(1),
            source: "manual".to_string(),
        };
        assert!(matches!(
            rate.validate(),
            Err(FxError::InvalidCurrencyPair(_))
        ));
    }

    #[test]
    fn test_new_rate_rejects_non_positive_rate() {
        let rate = NewCurrencyRate {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            base_currency: "USD".to_string(),
            target_currency: "RUB".to_string(),
            rate: dec!(0),
            source: "manual".to_string(),
        };
        assert!(matches!(rate.validate(), Err(FxError::InvalidRate(_))));
    }
}
