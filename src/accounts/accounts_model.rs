use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::accounts_errors::{AccountError, Result};

/// Domain model representing an investment account
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub provider: String,
    pub currency: String,
    pub is_active: bool,
}

impl NewAccount {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            ));
        }
        validate_currency_code(&self.currency)?;
        Ok(())
    }
}

/// Input model for updating an existing account. The currency is fixed at
/// creation time so historical balances keep a stable denomination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub is_active: bool,
}

impl AccountUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account ID is required for updates".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_currency_code(code: &str) -> Result<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(AccountError::InvalidData(format!(
            "Invalid currency code: {}",
            code
        )));
    }
    Ok(())
}

/// Database model for accounts
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDb {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AccountDb> for Account {
    fn from(db: AccountDb) -> Self {
        Account {
            id: db.id,
            name: db.name,
            provider: db.provider,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccount> for AccountDb {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        AccountDb {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            provider: domain.provider,
            currency: domain.currency,
            is_active: domain.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
