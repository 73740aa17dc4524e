//! Background forwarding of audit entries to the secondary store
//!
//! When enabled, the [`AuditLogger`](crate::core::AuditLogger) pushes every
//! accepted entry onto an unbounded channel. The task spawned here drains the
//! channel and upserts entries into the audit table in batches, so writes on
//! the request path never wait for the secondary store.

use super::secondary::{tables, SecondaryItem, SecondaryStore};
use super::synchronizer::{upsert_with_retry, SyncConfig};
use crate::types::AuditEntry;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Largest batch written in one upsert
const MAX_BATCH: usize = 256;

/// Spawn the mirror task
///
/// The task ends once every sender has been dropped and the channel is
/// drained. Entries that still fail after retries are logged and dropped;
/// the next full synchronization writes them again.
pub fn spawn_audit_mirror(
    store: Arc<dyn SecondaryStore>,
    mut rx: UnboundedReceiver<AuditEntry>,
    config: SyncConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Audit mirror started");
        let mut batch = Vec::with_capacity(MAX_BATCH);
        while let Some(entry) = rx.recv().await {
            batch.push(SecondaryItem::from(&entry));
            while batch.len() < MAX_BATCH {
                match rx.try_recv() {
                    Ok(entry) => batch.push(SecondaryItem::from(&entry)),
                    Err(_) => break,
                }
            }

            match upsert_with_retry(store.as_ref(), &config, tables::AUDIT_LOGS, &batch).await {
                Ok(attempts) => debug!(entries = batch.len(), attempts, "Audit entries mirrored"),
                Err(e) => error!(entries = batch.len(), error = %e, "Failed to mirror audit entries"),
            }
            batch.clear();
        }
        info!("Audit mirror stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuditLogger, LedgerService};
    use crate::sync::secondary::InMemorySecondaryStore;
    use crate::types::{AccountType, CustomerProfile};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_mirror_forwards_entries_until_senders_drop() {
        let store = Arc::new(InMemorySecondaryStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_audit_mirror(store.clone(), rx, SyncConfig::new(3, 1));

        let ledger = LedgerService::with_audit(
            Default::default(),
            AuditLogger::default().with_mirror(tx),
        );
        let customer = ledger
            .create_customer(CustomerProfile::default(), "teller")
            .await
            .unwrap();
        ledger
            .open_account("missing", AccountType::Savings, "teller")
            .await
            .unwrap_err();
        drop(ledger);
        handle.await.unwrap();

        let mirrored = store.scan(tables::AUDIT_LOGS).await.unwrap();
        assert_eq!(mirrored.len(), 2);
        assert!(mirrored
            .iter()
            .any(|item| item.attributes.get("entityId") == Some(&customer.customer_id)));
    }
}
