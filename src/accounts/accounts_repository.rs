use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::accounts;

use super::accounts_errors::{AccountError, Result};
use super::accounts_model::{Account, AccountDb, AccountUpdate, NewAccount};
use super::accounts_traits::AccountRepositoryTrait;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AccountRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl AccountRepositoryTrait for AccountRepository {
    fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let mut account_db: AccountDb = new_account.into();
        if account_db.id.is_empty() {
            account_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::insert_into(accounts::table)
            .values(&account_db)
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(account_db.into())
    }

    fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let mut existing = accounts::table
            .find(&account_update.id)
            .first::<AccountDb>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AccountError::NotFound(format!(
                    "Account with id {} not found",
                    account_update.id
                )),
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        existing.name = account_update.name;
        existing.provider = account_update.provider;
        existing.is_active = account_update.is_active;
        existing.updated_at = chrono::Utc::now().naive_utc();

        diesel::update(accounts::table.find(&existing.id))
            .set(&existing)
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(existing.into())
    }

    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let account = accounts::table
            .find(account_id)
            .first::<AccountDb>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", account_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        Ok(account.into())
    }

    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let mut query = accounts::table.into_boxed();

        if let Some(active) = is_active_filter {
            query = query.filter(accounts::is_active.eq(active));
        }

        query
            .order((accounts::is_active.desc(), accounts::name.asc()))
            .load::<AccountDb>(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Account::from).collect())
    }

    fn delete(&self, account_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(accounts::table.find(account_id))
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(AccountError::NotFound(format!(
                "Account with id {} not found",
                account_id
            )));
        }

        Ok(affected)
    }
}
