use std::collections::HashMap;

use super::accounts_errors::Result;
use super::accounts_model::{Account, AccountUpdate, NewAccount};

/// Trait defining the contract for account repository operations.
pub trait AccountRepositoryTrait: Send + Sync {
    fn create(&self, new_account: NewAccount) -> Result<Account>;
    fn update(&self, account_update: AccountUpdate) -> Result<Account>;
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
    fn delete(&self, account_id: &str) -> Result<usize>;
}

/// Trait defining the contract for account service operations.
pub trait AccountServiceTrait: Send + Sync {
    fn create_account(&self, new_account: NewAccount) -> Result<Account>;
    fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;
    fn delete_account(&self, account_id: &str) -> Result<()>;
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn get_all_accounts(&self) -> Result<Vec<Account>>;
    fn get_active_accounts(&self) -> Result<Vec<Account>>;
    /// Account ID to currency directory, used by aggregation passes.
    fn currencies_by_id(&self) -> Result<HashMap<String, String>>;
}
