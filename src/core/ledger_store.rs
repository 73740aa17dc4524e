//! Thread-safe account storage
//!
//! This module provides the `LedgerStore` struct, the single owner of account
//! records.
//!
//! # Design
//!
//! The `LedgerStore` uses `DashMap` (a concurrent HashMap) keyed by account
//! number. Reads return clones, so callers never hold a shard lock across an
//! await point. Balance changes are staged on a clone by the ledger service
//! while it holds the account lock, and written back with [`LedgerStore::put`]
//! inside the commit section.
//!
//! # Thread Safety
//!
//! All operations are thread-safe. Serialisation of competing mutations on
//! the same account is provided by [`crate::core::locks::AccountLocks`], not by
//! the map itself.

use crate::types::{Account, AccountNumber, CustomerId, LedgerError};
use dashmap::DashMap;

/// Thread-safe account state store
#[derive(Debug, Default)]
pub struct LedgerStore {
    /// Concurrent HashMap storing account states by account number
    accounts: DashMap<AccountNumber, Account>,
}

impl LedgerStore {
    /// Create a new empty LedgerStore
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Insert a new account or overwrite an existing one
    ///
    /// # Arguments
    ///
    /// * `account` - The account state to store
    ///
    /// # Thread Safety
    ///
    /// Callers must hold the account lock when overwriting an existing account,
    /// otherwise a concurrent staged update could be lost.
    pub fn put(&self, account: Account) {
        self.accounts
            .insert(account.account_number.clone(), account);
    }

    /// Get a snapshot of an account
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - A clone of the current state
    /// * `Err(LedgerError::AccountNotFound)` - No such account
    pub fn get(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.accounts
            .get(account_number)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::account_not_found(account_number))
    }

    pub fn contains(&self, account_number: &str) -> bool {
        self.accounts.contains_key(account_number)
    }

    /// Update an account in place using a closure
    ///
    /// The closure runs while holding the map entry, so no reader observes a
    /// partially-updated account. Used for non-monetary changes such as
    /// status updates.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The updated account
    /// * `Err(LedgerError)` - The account does not exist or the closure failed;
    ///   in the latter case the closure is responsible for leaving the account
    ///   untouched
    pub fn update<F>(&self, account_number: &str, f: F) -> Result<Account, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<(), LedgerError>,
    {
        let mut entry = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::account_not_found(account_number))?;
        f(entry.value_mut())?;
        Ok(entry.value().clone())
    }

    /// All accounts ordered by creation time, then account number
    pub fn all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.account_number.cmp(&b.account_number))
        });
        accounts
    }

    /// Accounts owned by one customer, in the order of [`LedgerStore::all`]
    pub fn for_customer(&self, customer_id: &CustomerId) -> Vec<Account> {
        self.all()
            .into_iter()
            .filter(|account| &account.customer_id == customer_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, AccountType};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::thread;

    fn account(number: &str, customer: &str) -> Account {
        Account::with_number(number.to_string(), customer.to_string(), AccountType::Savings)
    }

    #[test]
    fn test_get_missing_account_fails() {
        let store = LedgerStore::new();

        assert_eq!(
            store.get("ACC404"),
            Err(LedgerError::account_not_found("ACC404"))
        );
    }

    #[test]
    fn test_put_then_get_returns_snapshot() {
        let store = LedgerStore::new();
        store.put(account("ACC1", "c1"));

        let mut snapshot = store.get("ACC1").unwrap();
        snapshot.balance = Decimal::new(999, 0);

        assert_eq!(store.get("ACC1").unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_update_returns_error_from_closure() {
        let store = LedgerStore::new();
        store.put(account("ACC1", "c1"));

        let result = store.update("ACC1", |_| Err(LedgerError::nothing_to_undo("ACC1")));

        assert_eq!(result, Err(LedgerError::nothing_to_undo("ACC1")));
    }

    #[test]
    fn test_update_changes_status() {
        let store = LedgerStore::new();
        store.put(account("ACC1", "c1"));

        let updated = store
            .update("ACC1", |acc| {
                acc.status = AccountStatus::Frozen;
                Ok(())
            })
            .unwrap();

        assert_eq!(updated.status, AccountStatus::Frozen);
        assert_eq!(store.get("ACC1").unwrap().status, AccountStatus::Frozen);
    }

    #[test]
    fn test_for_customer_filters_by_owner() {
        let store = LedgerStore::new();
        store.put(account("ACC1", "c1"));
        store.put(account("ACC2", "c2"));
        store.put(account("ACC3", "c1"));

        let owned: Vec<String> = store
            .for_customer(&"c1".to_string())
            .into_iter()
            .map(|a| a.account_number)
            .collect();

        assert_eq!(owned.len(), 2);
        assert!(owned.contains(&"ACC1".to_string()));
        assert!(owned.contains(&"ACC3".to_string()));
    }

    #[test]
    fn test_concurrent_updates_to_different_accounts() {
        let store = Arc::new(LedgerStore::new());
        for i in 0..10 {
            store.put(account(&format!("ACC{}", i), "c1"));
        }

        let mut handles = vec![];
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    store
                        .update(&format!("ACC{}", i), |acc| {
                            acc.credit(Decimal::ONE, "deposit")
                        })
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..10 {
            assert_eq!(
                store.get(&format!("ACC{}", i)).unwrap().balance,
                Decimal::new(100, 0)
            );
        }
    }
}
