//! One-way replication of the ledger into a secondary store
//!
//! A synchronization pass takes a consistent [`LedgerSnapshot`] and upserts
//! four tables keyed by identifier. Passes are single-flight: a request that
//! arrives while one is running is rejected with `SyncInProgress` instead of
//! queueing. Each table write is retried with exponential backoff up to
//! `SyncConfig::max_attempts`; the four tables are written concurrently.
//!
//! Because every write is an upsert by key, re-running a pass without ledger
//! changes leaves the secondary store identical.

use super::secondary::{tables, SecondaryItem, SecondaryStore};
use crate::core::{LedgerService, LedgerSnapshot};
use crate::types::{LedgerError, StoreError};
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Logical collection names, in replication order
pub const COLLECTIONS: [&str; 4] = ["customers", "accounts", "transactions", "audit_logs"];

/// Secondary table names, in replication order
pub const TABLES: [&str; 4] = [
    tables::CUSTOMERS,
    tables::ACCOUNTS,
    tables::TRANSACTIONS,
    tables::AUDIT_LOGS,
];

/// Configuration for secondary-store writes
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Attempts per table write, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; later retries back off exponentially
    pub initial_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl SyncConfig {
    /// Create a SyncConfig with custom values
    ///
    /// Zero values are invalid and fall back to the defaults with a warning.
    pub fn new(max_attempts: u32, initial_backoff_ms: u64) -> Self {
        let default = Self::default();

        let max_attempts = if max_attempts == 0 {
            warn!(
                "Invalid sync max_attempts ({}), using default ({})",
                max_attempts, default.max_attempts
            );
            default.max_attempts
        } else {
            max_attempts
        };

        let initial_backoff = if initial_backoff_ms == 0 {
            warn!(
                "Invalid sync initial_backoff_ms ({}), using default ({})",
                initial_backoff_ms,
                default.initial_backoff.as_millis()
            );
            default.initial_backoff
        } else {
            Duration::from_millis(initial_backoff_ms)
        };

        Self {
            max_attempts,
            initial_backoff,
        }
    }
}

/// Outcome of the most recent synchronization attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub success: bool,
    pub message: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub collections: Vec<String>,
    pub tables: Vec<String>,
    /// Records written per collection
    pub records_synced: BTreeMap<String, usize>,
    /// Store writes performed, retries included
    pub attempts: u32,
}

impl SyncStatus {
    fn never_run() -> Self {
        SyncStatus {
            success: false,
            message: "No synchronization has run yet".to_string(),
            last_sync_at: None,
            collections: COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            tables: TABLES.iter().map(|t| t.to_string()).collect(),
            records_synced: BTreeMap::new(),
            attempts: 0,
        }
    }
}

/// Write `items` to `table`, retrying transient failures
///
/// # Returns
///
/// * `Ok(attempts)` - Number of attempts it took
/// * `Err(StoreError)` - The last error once `max_attempts` is exhausted
pub async fn upsert_with_retry(
    store: &dyn SecondaryStore,
    config: &SyncConfig,
    table: &str,
    items: &[SecondaryItem],
) -> Result<u32, StoreError> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_backoff)
        .with_max_elapsed_time(None)
        .build();
    let attempts = AtomicU32::new(0);
    let max_attempts = config.max_attempts;

    retry(policy, || async {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        match store.upsert(table, items).await {
            Ok(_) => Ok(()),
            Err(e) if attempt >= max_attempts => {
                error!(table, attempt, error = %e, "Secondary store write failed, giving up");
                Err(backoff::Error::permanent(e))
            }
            Err(e) => {
                warn!(table, attempt, error = %e, "Secondary store write failed, retrying");
                Err(backoff::Error::transient(e))
            }
        }
    })
    .await?;

    Ok(attempts.load(Ordering::SeqCst))
}

/// Replicates ledger snapshots into a secondary store
#[derive(Debug)]
pub struct Synchronizer {
    ledger: Arc<LedgerService>,
    store: Arc<dyn SecondaryStore>,
    config: SyncConfig,
    in_flight: Mutex<()>,
    last_status: RwLock<SyncStatus>,
}

impl Synchronizer {
    pub fn new(ledger: Arc<LedgerService>, store: Arc<dyn SecondaryStore>, config: SyncConfig) -> Self {
        Self {
            ledger,
            store,
            config,
            in_flight: Mutex::new(()),
            last_status: RwLock::new(SyncStatus::never_run()),
        }
    }

    /// Run one synchronization pass
    ///
    /// # Returns
    ///
    /// * `Ok(SyncStatus)` - All four tables were written
    /// * `Err(LedgerError::SyncInProgress)` - Another pass is running; the
    ///   recorded status is left untouched
    /// * `Err(LedgerError::SecondaryStore)` - A table write failed after
    ///   retries; the failure is recorded as the new status
    pub async fn sync_to_secondary(&self) -> Result<SyncStatus, LedgerError> {
        let _flight = self
            .in_flight
            .try_lock()
            .map_err(|_| LedgerError::SyncInProgress)?;

        info!("Synchronization started");
        let snapshot = self.ledger.snapshot().await;
        let replication = self.replicate(&snapshot).await;
        let now = Utc::now();
        let Replication {
            records: records_synced,
            attempts,
            error,
        } = replication;

        let (status, outcome) = match error {
            None => {
                let total: usize = records_synced.values().sum();
                let status = SyncStatus {
                    success: true,
                    message: format!(
                        "Synchronized {} records across {} tables",
                        total,
                        TABLES.len()
                    ),
                    last_sync_at: Some(now),
                    records_synced,
                    attempts,
                    ..SyncStatus::never_run()
                };
                info!(records = total, attempts, "Synchronization completed");
                (status.clone(), Ok(status))
            }
            Some(e) => {
                let status = SyncStatus {
                    success: false,
                    message: format!("Synchronization failed: {}", e),
                    last_sync_at: Some(now),
                    records_synced,
                    attempts,
                    ..SyncStatus::never_run()
                };
                error!(error = %e, "Synchronization failed");
                (status, Err(LedgerError::from(e)))
            }
        };

        *self.last_status.write().await = status;
        outcome
    }

    /// Last recorded status, without triggering a pass
    pub async fn status(&self) -> SyncStatus {
        self.last_status.read().await.clone()
    }

    /// Write the four tables concurrently
    ///
    /// Every table is attempted even when another fails; the first failure
    /// in table order is reported.
    async fn replicate(&self, snapshot: &LedgerSnapshot) -> Replication {
        let batches: [Vec<SecondaryItem>; 4] = [
            snapshot.customers.iter().map(SecondaryItem::from).collect(),
            snapshot.accounts.iter().map(SecondaryItem::from).collect(),
            snapshot.transactions.iter().map(SecondaryItem::from).collect(),
            snapshot.audit_logs.iter().map(SecondaryItem::from).collect(),
        ];

        let writes = TABLES
            .iter()
            .zip(batches.iter())
            .map(|(table, items)| upsert_with_retry(self.store.as_ref(), &self.config, table, items));
        let results = join_all(writes).await;

        let mut replication = Replication::default();
        for ((collection, items), result) in COLLECTIONS.iter().zip(batches.iter()).zip(results) {
            match result {
                Ok(used) => {
                    replication.attempts += used;
                    replication.records.insert(collection.to_string(), items.len());
                }
                Err(e) => {
                    replication.attempts += self.config.max_attempts;
                    replication.error.get_or_insert(e);
                }
            }
        }
        replication
    }
}

/// Outcome of writing every table once
#[derive(Debug, Default)]
struct Replication {
    records: BTreeMap<String, usize>,
    attempts: u32,
    error: Option<StoreError>,
}
