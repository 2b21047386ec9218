use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::currency_rates;

use super::fx_errors::{FxError, Result};
use super::fx_model::{CurrencyRate, CurrencyRateDb, NewCurrencyRate};
use super::fx_traits::FxRepositoryTrait;

/// Repository for the daily currency rate store
pub struct FxRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl FxRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl FxRepositoryTrait for FxRepository {
    fn find_exact(
        &self,
        date: NaiveDate,
        base: &str,
        target: &str,
    ) -> Result<Option<CurrencyRate>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let row = currency_rates::table
            .filter(currency_rates::date.eq(date))
            .filter(currency_rates::base_currency.eq(base))
            .filter(currency_rates::target_currency.eq(target))
            .first::<CurrencyRateDb>(&mut conn)
            .optional()?;

        Ok(row.map(CurrencyRate::from))
    }

    fn find_latest_on_or_before(
        &self,
        date: NaiveDate,
        base: &str,
        target: &str,
    ) -> Result<Option<CurrencyRate>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let row = currency_rates::table
            .filter(currency_rates::base_currency.eq(base))
            .filter(currency_rates::target_currency.eq(target))
            .filter(currency_rates::date.le(date))
            .order(currency_rates::date.desc())
            .first::<CurrencyRateDb>(&mut conn)
            .optional()?;

        Ok(row.map(CurrencyRate::from))
    }

    fn find_latest(&self) -> Result<Option<CurrencyRate>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let row = currency_rates::table
            .order(currency_rates::date.desc())
            .first::<CurrencyRateDb>(&mut conn)
            .optional()?;

        Ok(row.map(CurrencyRate::from))
    }

    fn has_any(&self) -> Result<bool> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let count: i64 = currency_rates::table.count().get_result(&mut conn)?;
        Ok(count > 0)
    }

    fn find_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: Option<&str>,
    ) -> Result<Vec<CurrencyRate>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let mut query = currency_rates::table
            .filter(currency_rates::date.ge(start))
            .filter(currency_rates::date.le(end))
            // Self-pairs carry no information and are filtered out of results.
            .filter(currency_rates::base_currency.ne(currency_rates::target_currency))
            .into_boxed();

        if let Some(base_code) = base {
            query = query.filter(currency_rates::base_currency.eq(base_code.to_string()));
        }

        let rows = query
            .order((
                currency_rates::date.desc(),
                currency_rates::base_currency.asc(),
            ))
            .load::<CurrencyRateDb>(&mut conn)?;

        Ok(rows.into_iter().map(CurrencyRate::from).collect())
    }

    fn upsert(&self, rate: NewCurrencyRate) -> Result<CurrencyRate> {
        rate.validate()?;

        let mut conn =
            get_connection(&self.pool).map_err(|e| FxError::DatabaseError(e.to_string()))?;

        let row: CurrencyRateDb = rate.into();

        diesel::insert_into(currency_rates::table)
            .values(&row)
            .on_conflict((
                currency_rates::date,
                currency_rates::base_currency,
                currency_rates::target_currency,
            ))
            .do_update()
            .set((
                currency_rates::rate.eq(&row.rate),
                currency_rates::source.eq(&row.source),
                currency_rates::fetched_at.eq(&row.fetched_at),
            ))
            .execute(&mut conn)?;

        let stored = currency_rates::table
            .filter(currency_rates::date.eq(row.date))
            .filter(currency_rates::base_currency.eq(&row.base_currency))
            .filter(currency_rates::target_currency.eq(&row.target_currency))
            .first::<CurrencyRateDb>(&mut conn)?;

        Ok(stored.into())
    }
}
