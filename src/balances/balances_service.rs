use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::accounts::AccountServiceTrait;
use crate::errors::Result;

use super::balances_errors::BalanceError;
use super::balances_model::{
    AccountBalance, BalanceEntry, NewAccountBalance, Period, PeriodSummary,
};
use super::balances_traits::{BalanceRepositoryTrait, BalanceServiceTrait};

/// Service owning balance edits and the month-close transition.
///
/// A reporting period is open by default and becomes closed through
/// `close_month`; closed periods accept no further edits.
pub struct BalanceService {
    repository: Arc<dyn BalanceRepositoryTrait>,
    account_service: Arc<dyn AccountServiceTrait>,
}

impl BalanceService {
    pub fn new(
        repository: Arc<dyn BalanceRepositoryTrait>,
        account_service: Arc<dyn AccountServiceTrait>,
    ) -> Self {
        Self {
            repository,
            account_service,
        }
    }

    fn account_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .account_service
            .get_all_accounts()?
            .into_iter()
            .map(|account| account.id)
            .collect())
    }
}

impl BalanceServiceTrait for BalanceService {
    fn upsert_batch(
        &self,
        period: Period,
        entries: Vec<BalanceEntry>,
    ) -> Result<Vec<AccountBalance>> {
        let accounts = self.account_service.get_all_accounts()?;
        let known_ids: HashSet<&str> = accounts.iter().map(|a| a.id.as_str()).collect();

        for entry in &entries {
            if !known_ids.contains(entry.account_id.as_str()) {
                return Err(BalanceError::AccountNotFound(entry.account_id.clone()).into());
            }
            entry.validate()?;
        }

        let ids: Vec<String> = accounts.into_iter().map(|a| a.id).collect();
        if self.repository.is_period_closed(&ids, period)? {
            return Err(BalanceError::PeriodClosed(period).into());
        }

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            let stored = self.repository.upsert(NewAccountBalance {
                account_id: entry.account_id,
                period_year: period.year,
                period_month: period.month,
                amount: entry.amount,
                net_flow: entry.net_flow,
                is_closed: false,
            })?;
            results.push(stored);
        }
        Ok(results)
    }

    fn get_balances(&self, period: Period) -> Result<Vec<AccountBalance>> {
        let ids = self.account_ids()?;
        Ok(self.repository.find_for_period(&ids, period)?)
    }

    fn close_month(&self, period: Period) -> Result<usize> {
        let accounts = self.account_service.get_all_accounts()?;
        let ids: Vec<String> = accounts.iter().map(|a| a.id.clone()).collect();

        let records = self.repository.find_for_period(&ids, period)?;
        if records.is_empty() {
            return Err(BalanceError::NoBalancesForPeriod(period).into());
        }
        if records.iter().all(|record| record.is_closed) {
            return Err(BalanceError::PeriodAlreadyClosed(period).into());
        }

        let next = period.next();
        let already_seeded: HashSet<String> = self
            .repository
            .find_for_period(&ids, next)?
            .into_iter()
            .map(|record| record.account_id)
            .collect();
        let active_ids: HashSet<&str> = accounts
            .iter()
            .filter(|account| account.is_active)
            .map(|account| account.id.as_str())
            .collect();

        let seeds: Vec<NewAccountBalance> = records
            .iter()
            .filter(|record| active_ids.contains(record.account_id.as_str()))
            .filter(|record| !already_seeded.contains(&record.account_id))
            .map(|record| NewAccountBalance {
                account_id: record.account_id.clone(),
                period_year: next.year,
                period_month: next.month,
                amount: record.amount,
                net_flow: Decimal::ZERO,
                is_closed: false,
            })
            .collect();

        debug!(
            "Closing period {}: {} records, {} rollover seeds into {}",
            period,
            records.len(),
            seeds.len(),
            next
        );

        let closed = self
            .repository
            .close_period_with_rollover(&ids, period, seeds)?;

        info!("Closed period {} ({} records)", period, closed);
        Ok(closed)
    }

    fn get_period_summary(&self, period: Period) -> Result<PeriodSummary> {
        let ids = self.account_ids()?;
        let records = self.repository.find_for_period(&ids, period)?;
        let has_balances = !records.is_empty();
        Ok(PeriodSummary {
            period_year: period.year,
            period_month: period.month,
            is_closed: has_balances && records.iter().all(|record| record.is_closed),
            has_balances,
        })
    }

    fn list_period_summaries(&self) -> Result<Vec<PeriodSummary>> {
        let ids = self.account_ids()?;
        let records = self.repository.find_all(&ids)?;

        let mut by_period: BTreeMap<Period, bool> = BTreeMap::new();
        for record in records {
            by_period
                .entry(record.period())
                .and_modify(|all_closed| *all_closed &= record.is_closed)
                .or_insert(record.is_closed);
        }

        // Newest first, matching how the periods are browsed.
        Ok(by_period
            .into_iter()
            .rev()
            .map(|(period, all_closed)| PeriodSummary {
                period_year: period.year,
                period_month: period.month,
                is_closed: all_closed,
                has_balances: true,
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::accounts::{Account, AccountError, AccountUpdate, NewAccount};
    use crate::errors::Error;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::RwLock;

    pub(crate) struct MockAccountService {
        accounts: Vec<Account>,
    }

    impl MockAccountService {
        pub(crate) fn new(accounts: Vec<(&str, &str, bool)>) -> Self {
            let accounts = accounts
                .into_iter()
                .map(|(id, currency, is_active)| Account {
                    id: id.to_string(),
                    name: id.to_string(),
                    provider: "IBKR".to_string(),
                    currency: currency.to_string(),
                    is_active,
                    ..Default::default()
                })
                .collect();
            Self { accounts }
        }
    }

    impl AccountServiceTrait for MockAccountService {
        fn create_account(
            &self,
            _new_account: NewAccount,
        ) -> crate::accounts::Result<Account> {
            Err(AccountError::InvalidData("not implemented".to_string()))
        }
        fn update_account(
            &self,
            _account_update: AccountUpdate,
        ) -> crate::accounts::Result<Account> {
            Err(AccountError::InvalidData("not implemented".to_string()))
        }
        fn delete_account(&self, _account_id: &str) -> crate::accounts::Result<()> {
            Err(AccountError::InvalidData("not implemented".to_string()))
        }
        fn get_account(&self, _account_id: &str) -> crate::accounts::Result<Account> {
            Err(AccountError::InvalidData("not implemented".to_string()))
        }
        fn get_all_accounts(&self) -> crate::accounts::Result<Vec<Account>> {
            Ok(self.accounts.clone())
        }
        fn get_active_accounts(&self) -> crate::accounts::Result<Vec<Account>> {
            Ok(self
                .accounts
                .iter()
                .filter(|a| a.is_active)
                .cloned()
                .collect())
        }
        fn currencies_by_id(&self) -> crate::accounts::Result<HashMap<String, String>> {
            Ok(self
                .accounts
                .iter()
                .map(|a| (a.id.clone(), a.currency.clone()))
                .collect())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockBalanceRepository {
        records: RwLock<Vec<AccountBalance>>,
    }

    impl MockBalanceRepository {
        pub(crate) fn with_records(records: Vec<AccountBalance>) -> Self {
            Self {
                records: RwLock::new(records),
            }
        }

        pub(crate) fn record(account_id: &str, period: Period, amount: Decimal, is_closed: bool) -> AccountBalance {
            AccountBalance {
                id: format!("{}-{}", account_id, period),
                account_id: account_id.to_string(),
                period_year: period.year,
                period_month: period.month,
                amount,
                net_flow: Decimal::ZERO,
                is_closed,
                updated_at: chrono::Utc::now().naive_utc(),
            }
        }
    }

    impl BalanceRepositoryTrait for MockBalanceRepository {
        fn upsert(
            &self,
            balance: NewAccountBalance,
        ) -> crate::balances::Result<AccountBalance> {
            let mut records = self.records.write().unwrap();
            let mut stored = Self::record(
                &balance.account_id,
                Period {
                    year: balance.period_year,
                    month: balance.period_month,
                },
                balance.amount,
                balance.is_closed,
            );
            stored.net_flow = balance.net_flow;
            records.retain(|r| {
                !(r.account_id == balance.account_id
                    && r.period_year == balance.period_year
                    && r.period_month == balance.period_month)
            });
            records.push(stored.clone());
            Ok(stored)
        }

        fn find_for_period(
            &self,
            account_ids: &[String],
            period: Period,
        ) -> crate::balances::Result<Vec<AccountBalance>> {
            Ok(self
                .records
                .read()
                .unwrap()
                .iter()
                .filter(|r| {
                    account_ids.contains(&r.account_id)
                        && r.period_year == period.year
                        && r.period_month == period.month
                })
                .cloned()
                .collect())
        }

        fn find_all(
            &self,
            account_ids: &[String],
        ) -> crate::balances::Result<Vec<AccountBalance>> {
            let mut records: Vec<AccountBalance> = self
                .records
                .read()
                .unwrap()
                .iter()
                .filter(|r| account_ids.contains(&r.account_id))
                .cloned()
                .collect();
            records.sort_by_key(|r| r.period());
            Ok(records)
        }

        fn is_period_closed(
            &self,
            account_ids: &[String],
            period: Period,
        ) -> crate::balances::Result<bool> {
            Ok(self
                .find_for_period(account_ids, period)?
                .iter()
                .any(|r| r.is_closed))
        }

        fn close_period_with_rollover(
            &self,
            account_ids: &[String],
            period: Period,
            seeds: Vec<NewAccountBalance>,
        ) -> crate::balances::Result<usize> {
            let mut closed = 0;
            {
                let mut records = self.records.write().unwrap();
                for record in records.iter_mut() {
                    if account_ids.contains(&record.account_id)
                        && record.period_year == period.year
                        && record.period_month == period.month
                    {
                        record.is_closed = true;
                        closed += 1;
                    }
                }
                for seed in seeds {
                    let exists = records.iter().any(|r| {
                        r.account_id == seed.account_id
                            && r.period_year == seed.period_year
                            && r.period_month == seed.period_month
                    });
                    if !exists {
                        let stored = Self::record(
                            &seed.account_id,
                            Period {
                                year: seed.period_year,
                                month: seed.period_month,
                            },
                            seed.amount,
                            seed.is_closed,
                        );
                        records.push(stored);
                    }
                }
            }
            Ok(closed)
        }
    }

    fn service(
        accounts: Vec<(&str, &str, bool)>,
        records: Vec<AccountBalance>,
    ) -> (BalanceService, Arc<MockBalanceRepository>) {
        let repository = Arc::new(MockBalanceRepository::with_records(records));
        let service = BalanceService::new(
            repository.clone(),
            Arc::new(MockAccountService::new(accounts)),
        );
        (service, repository)
    }

    fn jan() -> Period {
        Period::new(2024, 1).unwrap()
    }

    fn feb() -> Period {
        Period::new(2024, 2).unwrap()
    }

    #[test]
    fn test_close_month_marks_records_and_seeds_next_period() {
        let (service, repository) = service(
            vec![("a1", "USD", true), ("a2", "USD", false)],
            vec![
                MockBalanceRepository::record("a1", jan(), dec!(1000), false),
                MockBalanceRepository::record("a2", jan(), dec!(500), false),
            ],
        );

        let closed = service.close_month(jan()).unwrap();
        assert_eq!(closed, 2);

        let ids = vec!["a1".to_string(), "a2".to_string()];
        let jan_records = repository.find_for_period(&ids, jan()).unwrap();
        assert!(jan_records.iter().all(|r| r.is_closed));

        // Only the active account rolls forward, with net flow reset.
        let feb_records = repository.find_for_period(&ids, feb()).unwrap();
        assert_eq!(feb_records.len(), 1);
        assert_eq!(feb_records[0].account_id, "a1");
        assert_eq!(feb_records[0].amount, dec!(1000));
        assert_eq!(feb_records[0].net_flow, Decimal::ZERO);
        assert!(!feb_records[0].is_closed);
    }

    #[test]
    fn test_close_month_does_not_overwrite_existing_next_period() {
        let (service, repository) = service(
            vec![("a1", "USD", true)],
            vec![
                MockBalanceRepository::record("a1", jan(), dec!(1000), false),
                MockBalanceRepository::record("a1", feb(), dec!(1234), false),
            ],
        );

        service.close_month(jan()).unwrap();

        let ids = vec!["a1".to_string()];
        let feb_records = repository.find_for_period(&ids, feb()).unwrap();
        assert_eq!(feb_records.len(), 1);
        assert_eq!(feb_records[0].amount, dec!(1234));
    }

    #[test]
    fn test_close_month_without_balances_fails() {
        let (service, _) = service(vec![("a1", "USD", true)], vec![]);
        let result = service.close_month(jan());
        assert!(matches!(
            result,
            Err(Error::Balance(BalanceError::NoBalancesForPeriod(_)))
        ));
    }

    #[test]
    fn test_close_month_twice_reports_already_closed_without_duplicate_seeds() {
        let (service, repository) = service(
            vec![("a1", "USD", true)],
            vec![MockBalanceRepository::record("a1", jan(), dec!(1000), false)],
        );

        service.close_month(jan()).unwrap();
        let second = service.close_month(jan());
        assert!(matches!(
            second,
            Err(Error::Balance(BalanceError::PeriodAlreadyClosed(_)))
        ));

        let ids = vec!["a1".to_string()];
        assert_eq!(repository.find_for_period(&ids, feb()).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_batch_rejects_closed_period() {
        let (service, _) = service(
            vec![("a1", "USD", true)],
            vec![MockBalanceRepository::record("a1", jan(), dec!(1000), true)],
        );

        let result = service.upsert_batch(
            jan(),
            vec![BalanceEntry {
                account_id: "a1".to_string(),
                amount: dec!(2000),
                net_flow: dec!(0),
            }],
        );
        assert!(matches!(
            result,
            Err(Error::Balance(BalanceError::PeriodClosed(_)))
        ));
    }

    #[test]
    fn test_upsert_batch_rejects_unknown_account() {
        let (service, _) = service(vec![("a1", "USD", true)], vec![]);
        let result = service.upsert_batch(
            jan(),
            vec![BalanceEntry {
                account_id: "ghost".to_string(),
                amount: dec!(1),
                net_flow: dec!(0),
            }],
        );
        assert!(matches!(
            result,
            Err(Error::Balance(BalanceError::AccountNotFound(_)))
        ));
    }

    #[test]
    fn test_upsert_batch_stores_entries_open() {
        let (service, _) = service(vec![("a1", "USD", true)], vec![]);
        let stored = service
            .upsert_batch(
                jan(),
                vec![BalanceEntry {
                    account_id: "a1".to_string(),
                    amount: dec!(150.50),
                    net_flow: dec!(-20),
                }],
            )
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, dec!(150.50));
        assert!(!stored[0].is_closed);
    }

    #[test]
    fn test_period_summary_reports_empty_period() {
        let (service, _) = service(
            vec![("a1", "USD", true)],
            vec![MockBalanceRepository::record("a1", jan(), dec!(1), true)],
        );

        let empty = service.get_period_summary(feb()).unwrap();
        assert!(!empty.has_balances);
        assert!(!empty.is_closed);

        let closed = service.get_period_summary(jan()).unwrap();
        assert!(closed.has_balances);
        assert!(closed.is_closed);
    }

    #[test]
    fn test_period_summaries_roll_up_closed_state() {
        let (service, _) = service(
            vec![("a1", "USD", true), ("a2", "USD", true)],
            vec![
                MockBalanceRepository::record("a1", jan(), dec!(1), true),
                MockBalanceRepository::record("a2", jan(), dec!(1), false),
                MockBalanceRepository::record("a1", feb(), dec!(1), true),
            ],
        );

        let summaries = service.list_period_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        // Newest first
        assert_eq!(summaries[0].period_month, 2);
        assert!(summaries[0].is_closed);
        // January has one open record, so the period is not closed.
        assert_eq!(summaries[1].period_month, 1);
        assert!(!summaries[1].is_closed);
    }
}
