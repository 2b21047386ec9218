use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::account_balances;

use super::balances_errors::{BalanceError, Result};
use super::balances_model::{AccountBalance, AccountBalanceDb, NewAccountBalance, Period};
use super::balances_traits::BalanceRepositoryTrait;

/// Repository for managing balance records in the database
pub struct BalanceRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl BalanceRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl BalanceRepositoryTrait for BalanceRepository {
    fn upsert(&self, balance: NewAccountBalance) -> Result<AccountBalance> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BalanceError::DatabaseError(e.to_string()))?;

        let row: AccountBalanceDb = balance.into();

        diesel::insert_into(account_balances::table)
            .values(&row)
            .on_conflict((
                account_balances::account_id,
                account_balances::period_year,
                account_balances::period_month,
            ))
            .do_update()
            .set((
                account_balances::amount.eq(&row.amount),
                account_balances::net_flow.eq(&row.net_flow),
                account_balances::updated_at.eq(&row.updated_at),
            ))
            .execute(&mut conn)?;

        let stored = account_balances::table
            .filter(account_balances::account_id.eq(&row.account_id))
            .filter(account_balances::period_year.eq(row.period_year))
            .filter(account_balances::period_month.eq(row.period_month))
            .first::<AccountBalanceDb>(&mut conn)?;

        Ok(stored.into())
    }

    fn find_for_period(
        &self,
        account_ids: &[String],
        period: Period,
    ) -> Result<Vec<AccountBalance>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BalanceError::DatabaseError(e.to_string()))?;

        let rows = account_balances::table
            .filter(account_balances::account_id.eq_any(account_ids))
            .filter(account_balances::period_year.eq(period.year))
            .filter(account_balances::period_month.eq(period.month as i32))
            .load::<AccountBalanceDb>(&mut conn)?;

        Ok(rows.into_iter().map(AccountBalance::from).collect())
    }

    fn find_all(&self, account_ids: &[String]) -> Result<Vec<AccountBalance>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BalanceError::DatabaseError(e.to_string()))?;

        let rows = account_balances::table
            .filter(account_balances::account_id.eq_any(account_ids))
            .order((
                account_balances::period_year.asc(),
                account_balances::period_month.asc(),
            ))
            .load::<AccountBalanceDb>(&mut conn)?;

        Ok(rows.into_iter().map(AccountBalance::from).collect())
    }

    fn is_period_closed(&self, account_ids: &[String], period: Period) -> Result<bool> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BalanceError::DatabaseError(e.to_string()))?;

        let closed: i64 = account_balances::table
            .filter(account_balances::account_id.eq_any(account_ids))
            .filter(account_balances::period_year.eq(period.year))
            .filter(account_balances::period_month.eq(period.month as i32))
            .filter(account_balances::is_closed.eq(true))
            .count()
            .get_result(&mut conn)?;

        Ok(closed > 0)
    }

    fn close_period_with_rollover(
        &self,
        account_ids: &[String],
        period: Period,
        seeds: Vec<NewAccountBalance>,
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| BalanceError::DatabaseError(e.to_string()))?;

        conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let closed = diesel::update(
                account_balances::table
                    .filter(account_balances::account_id.eq_any(account_ids))
                    .filter(account_balances::period_year.eq(period.year))
                    .filter(account_balances::period_month.eq(period.month as i32)),
            )
            .set((
                account_balances::is_closed.eq(true),
                account_balances::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)?;

            // Seeds never overwrite rows the user already entered for the
            // following period.
            for seed in seeds {
                let row: AccountBalanceDb = seed.into();
                diesel::insert_into(account_balances::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }

            Ok(closed)
        })
        .map_err(BalanceError::from)
    }
}
