//! Secondary store abstraction
//!
//! The secondary store is a key-value view of the ledger: tables of items,
//! each item a key plus a flat map of string attributes. Two implementations
//! are provided:
//!
//! - [`InMemorySecondaryStore`] keeps everything in ordered maps.
//! - [`CsvSecondaryStore`] keeps one CSV file per table in a directory.
//!
//! Both upsert by key, so writing the same items twice leaves the store
//! unchanged.

use crate::types::{Account, AuditEntry, Customer, StoreError, Transaction};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Table names in the secondary store
pub mod tables {
    pub const CUSTOMERS: &str = "BankingCustomers";
    pub const ACCOUNTS: &str = "BankingAccounts";
    pub const TRANSACTIONS: &str = "BankingTransactions";
    pub const AUDIT_LOGS: &str = "BankingAuditLogs";
}

/// Item attributes, ordered by name
pub type Attributes = BTreeMap<String, String>;

/// One keyed item of a secondary table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryItem {
    pub key: String,
    pub attributes: Attributes,
}

impl SecondaryItem {
    fn new<I>(key: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, String)>,
    {
        SecondaryItem {
            key: key.into(),
            attributes: attributes
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

impl From<&Customer> for SecondaryItem {
    fn from(customer: &Customer) -> Self {
        let profile = &customer.profile;
        SecondaryItem::new(
            customer.customer_id.clone(),
            [
                ("firstName", profile.first_name.clone()),
                ("lastName", profile.last_name.clone()),
                ("email", profile.email.clone()),
                ("mobileNumber", profile.mobile_number.clone()),
                ("address", profile.address.clone()),
                ("city", profile.city.clone()),
                ("state", profile.state.clone()),
                ("pincode", profile.pincode.clone()),
                ("createdAt", customer.created_at.to_rfc3339()),
            ],
        )
    }
}

impl From<&Account> for SecondaryItem {
    fn from(account: &Account) -> Self {
        SecondaryItem::new(
            account.account_number.clone(),
            [
                ("customerId", account.customer_id.clone()),
                ("accountType", account.account_type.as_str().to_string()),
                ("balance", account.balance.to_string()),
                ("currency", account.currency.clone()),
                ("status", account.status.as_str().to_string()),
                ("createdAt", account.created_at.to_rfc3339()),
                ("updatedAt", account.updated_at.to_rfc3339()),
                (
                    "lastTransactionAt",
                    optional(&account.last_transaction_at.map(|at| at.to_rfc3339())),
                ),
            ],
        )
    }
}

impl From<&Transaction> for SecondaryItem {
    fn from(tx: &Transaction) -> Self {
        SecondaryItem::new(
            tx.transaction_id.to_string(),
            [
                ("reference", tx.reference.clone()),
                ("transactionType", tx.tx_type.as_str().to_string()),
                ("amount", tx.amount.to_string()),
                ("accountNumber", tx.account_number.clone()),
                ("counterparty", optional(&tx.counterparty)),
                ("correlationId", optional(&tx.correlation_id)),
                ("origin", tx.origin.to_string()),
                ("reverses", optional(&tx.reverses)),
                ("description", tx.description.clone()),
                ("status", tx.status.as_str().to_string()),
                ("performedBy", tx.performed_by.clone()),
                ("timestamp", tx.timestamp.to_rfc3339()),
            ],
        )
    }
}

impl From<&AuditEntry> for SecondaryItem {
    fn from(entry: &AuditEntry) -> Self {
        SecondaryItem::new(
            entry.action_id.to_string(),
            [
                ("userId", entry.user_id.clone()),
                ("action", entry.action.clone()),
                ("entityType", entry.entity_type.clone()),
                ("entityId", entry.entity_id.clone()),
                ("result", entry.result.as_str().to_string()),
                ("description", entry.description.clone()),
                ("errorMessage", optional(&entry.error_message)),
                ("timestamp", entry.timestamp.to_rfc3339()),
            ],
        )
    }
}

/// Destination of the synchronizer and the audit mirror
#[async_trait]
pub trait SecondaryStore: Send + Sync + fmt::Debug {
    /// Insert or replace items by key
    ///
    /// # Returns
    ///
    /// Number of items written
    async fn upsert(&self, table: &str, items: &[SecondaryItem]) -> Result<usize, StoreError>;

    /// Every item of a table, ordered by key
    async fn scan(&self, table: &str) -> Result<Vec<SecondaryItem>, StoreError>;
}

/// Secondary store held in memory
#[derive(Debug, Default)]
pub struct InMemorySecondaryStore {
    tables: RwLock<BTreeMap<String, BTreeMap<String, Attributes>>>,
}

impl InMemorySecondaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecondaryStore for InMemorySecondaryStore {
    async fn upsert(&self, table: &str, items: &[SecondaryItem]) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        for item in items {
            rows.insert(item.key.clone(), item.attributes.clone());
        }
        Ok(items.len())
    }

    async fn scan(&self, table: &str) -> Result<Vec<SecondaryItem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|(key, attributes)| SecondaryItem {
                        key: key.clone(),
                        attributes: attributes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Secondary store backed by one CSV file per table
///
/// Each file has a `key` column followed by the sorted union of attribute
/// names. An upsert reads the file, merges by key and rewrites it sorted by
/// key through a temporary file. Upserts are serialised by an internal lock.
#[derive(Debug)]
pub struct CsvSecondaryStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

const KEY_COLUMN: &str = "key";

impl CsvSecondaryStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io("*", e))?;
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", table))
    }

    fn read_table(path: &Path, table: &str) -> Result<BTreeMap<String, Attributes>, StoreError> {
        let mut rows = BTreeMap::new();
        if !path.exists() {
            return Ok(rows);
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| StoreError::csv(table, e))?;
        let headers = reader
            .headers()
            .map_err(|e| StoreError::csv(table, e))?
            .clone();
        for record in reader.records() {
            let record = record.map_err(|e| StoreError::csv(table, e))?;
            let mut key = None;
            let mut attributes = Attributes::new();
            for (name, value) in headers.iter().zip(record.iter()) {
                if name == KEY_COLUMN {
                    key = Some(value.to_string());
                } else {
                    attributes.insert(name.to_string(), value.to_string());
                }
            }
            if let Some(key) = key {
                rows.insert(key, attributes);
            }
        }
        Ok(rows)
    }

    fn write_table(
        path: &Path,
        table: &str,
        rows: &BTreeMap<String, Attributes>,
    ) -> Result<(), StoreError> {
        let columns: BTreeSet<&String> = rows.values().flat_map(|attrs| attrs.keys()).collect();
        let tmp_path = path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp_path).map_err(|e| StoreError::io(table, e))?;
            let mut writer = csv::Writer::from_writer(file);
            let mut header = vec![KEY_COLUMN];
            header.extend(columns.iter().map(|name| name.as_str()));
            writer
                .write_record(&header)
                .map_err(|e| StoreError::csv(table, e))?;
            for (key, attributes) in rows {
                let mut record = vec![key.as_str()];
                record.extend(
                    columns
                        .iter()
                        .map(|name| attributes.get(*name).map(String::as_str).unwrap_or("")),
                );
                writer
                    .write_record(&record)
                    .map_err(|e| StoreError::csv(table, e))?;
            }
            writer
                .flush()
                .map_err(|e| StoreError::io(table, e))?;
        }
        std::fs::rename(&tmp_path, path).map_err(|e| StoreError::io(table, e))
    }
}

#[async_trait]
impl SecondaryStore for CsvSecondaryStore {
    async fn upsert(&self, table: &str, items: &[SecondaryItem]) -> Result<usize, StoreError> {
        let _write = self.write_lock.lock().await;
        let path = self.table_path(table);
        let table_name = table.to_string();
        let items = items.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut rows = Self::read_table(&path, &table_name)?;
            for item in &items {
                rows.insert(item.key.clone(), item.attributes.clone());
            }
            Self::write_table(&path, &table_name, &rows)?;
            Ok::<usize, StoreError>(items.len())
        })
        .await
        .map_err(|e| StoreError::unavailable(table, e.to_string()))?
    }

    async fn scan(&self, table: &str) -> Result<Vec<SecondaryItem>, StoreError> {
        let path = self.table_path(table);
        let table_name = table.to_string();
        let rows = tokio::task::spawn_blocking(move || Self::read_table(&path, &table_name))
            .await
            .map_err(|e| StoreError::unavailable(table, e.to_string()))??;
        Ok(rows
            .into_iter()
            .map(|(key, attributes)| SecondaryItem { key, attributes })
            .collect())
    }
}
