//! Append-only transaction journal
//!
//! This module provides the `Journal` struct, the ordered record of every
//! monetary operation.
//!
//! # Design
//!
//! Records live in a `DashMap` keyed by transaction id, with a per-account
//! index of ids in append order. Ids are issued from an `AtomicU64`, so they
//! are unique and strictly increasing across the whole ledger.
//!
//! The only in-place change ever made is [`Journal::mark_reversed`], which
//! moves a COMPLETED record to REVERSED when it is undone.
//!
//! # Invariant
//!
//! For every account, `balance == Σ balance_contribution` over its records
//! (see [`Journal::balance_of`]). The ledger service keeps this by appending
//! and reversing records in the same commit section that updates balances.

use crate::types::transaction::format_reference;
use crate::types::{
    AccountNumber, Transaction, TransactionId, TransactionStatus, TransactionType,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe append-only journal
#[derive(Debug)]
pub struct Journal {
    /// Records by transaction id
    entries: DashMap<TransactionId, Transaction>,

    /// Per-account record ids in append order
    by_account: DashMap<AccountNumber, Vec<TransactionId>>,

    /// Next id to issue
    next_id: AtomicU64,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            by_account: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a COMPLETED record with a freshly issued id
    ///
    /// The record is not stored until [`Journal::append`] is called. Its
    /// `origin` equals its own id; redo and reversal records overwrite the
    /// linkage fields before appending.
    ///
    /// # Arguments
    ///
    /// * `tx_type` - Type of the record
    /// * `account_number` - Account the record belongs to
    /// * `amount` - Positive amount
    /// * `description` - Free text supplied by the caller
    /// * `actor` - User that requested the operation
    pub fn draft(
        &self,
        tx_type: TransactionType,
        account_number: &str,
        amount: Decimal,
        description: &str,
        actor: &str,
    ) -> Transaction {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Transaction {
            transaction_id: id,
            reference: format_reference(tx_type, id),
            tx_type,
            amount,
            account_number: account_number.to_string(),
            counterparty: None,
            correlation_id: None,
            origin: id,
            reverses: None,
            description: description.to_string(),
            status: TransactionStatus::Completed,
            performed_by: actor.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Store a record and index it under its account
    pub fn append(&self, transaction: Transaction) {
        let id = transaction.transaction_id;
        self.by_account
            .entry(transaction.account_number.clone())
            .or_default()
            .push(id);
        self.entries.insert(id, transaction);
    }

    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    /// Move a COMPLETED record to REVERSED
    ///
    /// # Returns
    ///
    /// The updated record, or `None` if no COMPLETED record has this id
    pub fn mark_reversed(&self, id: TransactionId) -> Option<Transaction> {
        let mut entry = self.entries.get_mut(&id)?;
        if entry.status != TransactionStatus::Completed {
            return None;
        }
        entry.status = TransactionStatus::Reversed;
        Some(entry.value().clone())
    }

    /// Records of one account, newest first
    pub fn history(&self, account_number: &str) -> Vec<Transaction> {
        let ids = self
            .by_account
            .get(account_number)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        ids.into_iter()
            .rev()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Records of one account and type, newest first
    pub fn history_of_type(&self, account_number: &str, tx_type: TransactionType) -> Vec<Transaction> {
        self.history(account_number)
            .into_iter()
            .filter(|tx| tx.tx_type == tx_type)
            .collect()
    }

    /// Record that currently carries the effect of `origin` on an account
    ///
    /// This is the newest COMPLETED non-reversal record of the account whose
    /// origin matches. Undo marks exactly this record REVERSED.
    pub fn effective_record(&self, account_number: &str, origin: TransactionId) -> Option<Transaction> {
        self.history(account_number).into_iter().find(|tx| {
            tx.origin == origin
                && tx.status == TransactionStatus::Completed
                && tx.tx_type != TransactionType::Reversal
        })
    }

    /// Sum of the balance contributions of an account's records
    pub fn balance_of(&self, account_number: &str) -> Decimal {
        self.history(account_number)
            .iter()
            .map(Transaction::balance_contribution)
            .sum()
    }

    /// Every record in id order
    pub fn all(&self) -> Vec<Transaction> {
        let mut records: Vec<Transaction> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|tx| tx.transaction_id);
        records
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
