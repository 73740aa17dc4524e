//! Per-account exclusive scopes
//!
//! `AccountLocks` hands out one async mutex per account number. Operations
//! that touch several accounts acquire them in sorted order with duplicates
//! removed, which rules out lock-order deadlocks between concurrent
//! transfers. Each acquisition is bounded by a timeout; on expiry everything
//! acquired so far is released and `LedgerError::LockTimeout` is returned.

use crate::types::LedgerError;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

/// Guards for a set of account locks, released on drop
#[derive(Debug)]
pub struct AccountGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

#[derive(Debug)]
pub struct AccountLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the locks of every listed account
    ///
    /// # Arguments
    ///
    /// * `accounts` - Account numbers, in any order, duplicates allowed
    ///
    /// # Returns
    ///
    /// * `Ok(AccountGuard)` - All locks are held until the guard is dropped
    /// * `Err(LedgerError::LockTimeout)` - One lock was not acquired in time;
    ///   none are held
    pub async fn acquire(&self, accounts: &[&str]) -> Result<AccountGuard, LedgerError> {
        let mut ordered: Vec<&str> = accounts.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for account in ordered {
            let mutex = self.mutex_for(account);
            match tokio::time::timeout(self.timeout, mutex.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    let timeout_ms = self.timeout.as_millis() as u64;
                    warn!(account, timeout_ms, "Account lock acquisition timed out");
                    return Err(LedgerError::lock_timeout(account, timeout_ms));
                }
            }
        }
        Ok(AccountGuard { _guards: guards })
    }

    fn mutex_for(&self, account: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(account.to_string())
            .or_default()
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_accounts_lock_once() {
        let locks = AccountLocks::new(Duration::from_millis(50));

        let guard = locks.acquire(&["ACC1", "ACC1"]).await;

        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        let _held = locks.acquire(&["ACC1"]).await.unwrap();

        let result = locks.acquire(&["ACC2", "ACC1"]).await;

        assert_eq!(result.unwrap_err(), LedgerError::lock_timeout("ACC1", 20));
    }

    #[tokio::test]
    async fn test_timeout_releases_partially_acquired_locks() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        let held = locks.acquire(&["ACC2"]).await.unwrap();

        assert!(locks.acquire(&["ACC1", "ACC2"]).await.is_err());
        drop(held);

        assert!(locks.acquire(&["ACC1"]).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_on_drop() {
        let locks = AccountLocks::new(Duration::from_millis(20));
        {
            let _guard = locks.acquire(&["ACC1", "ACC2"]).await.unwrap();
        }

        assert!(locks.acquire(&["ACC2", "ACC1"]).await.is_ok());
    }
}
