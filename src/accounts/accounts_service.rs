use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::accounts_errors::Result;
use super::accounts_model::{Account, AccountUpdate, NewAccount};
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};

/// Service for managing accounts
pub struct AccountService {
    repository: Arc<dyn AccountRepositoryTrait>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl AccountServiceTrait for AccountService {
    fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        debug!(
            "Creating account {} ({})",
            new_account.name, new_account.currency
        );
        self.repository.create(new_account)
    }

    fn update_account(&self, account_update: AccountUpdate) -> Result<Account> {
        self.repository.update(account_update)
    }

    fn delete_account(&self, account_id: &str) -> Result<()> {
        self.repository.delete(account_id)?;
        Ok(())
    }

    fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    fn get_all_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list(None)
    }

    fn get_active_accounts(&self) -> Result<Vec<Account>> {
        self.repository.list(Some(true))
    }

    fn currencies_by_id(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .repository
            .list(None)?
            .into_iter()
            .map(|account| (account.id, account.currency))
            .collect())
    }
}
