//! Transaction-related types for the banking ledger
//!
//! This module defines journal records, their types and statuses. Records are
//! append-only; the only change ever made to a stored record is the
//! COMPLETED to REVERSED status transition performed by undo.

use super::account::AccountNumber;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction identifier
///
/// Issued monotonically by the journal, starting at 1.
pub type TransactionId = u64;

/// Transaction types recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account
    Withdraw,

    /// Debit half of a transfer
    TransferOut,

    /// Credit half of a transfer
    TransferIn,

    /// Documents that an earlier record was undone
    ///
    /// Carries no balance effect of its own: the reversed record is marked
    /// REVERSED and so stops contributing to the balance.
    Reversal,
}

impl TransactionType {
    /// Signed balance effect of a COMPLETED record of this type
    ///
    /// # Arguments
    ///
    /// * `amount` - The (positive) record amount
    ///
    /// # Returns
    ///
    /// `+amount` for credits, `-amount` for debits, zero for reversals
    pub fn signed_effect(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Deposit | TransactionType::TransferIn => amount,
            TransactionType::Withdraw | TransactionType::TransferOut => -amount,
            TransactionType::Reversal => Decimal::ZERO,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::TransferOut => "TRANSFER_OUT",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::Reversal => "REVERSAL",
        }
    }

    /// Prefix of the human readable reference
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEP",
            TransactionType::Withdraw => "WDR",
            TransactionType::TransferOut => "TRO",
            TransactionType::TransferIn => "TRI",
            TransactionType::Reversal => "REV",
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, TransactionType::TransferOut | TransactionType::TransferIn)
    }
}

/// Status of a journal record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Reversed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Reversed => "REVERSED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

/// A journal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Journal-issued identifier
    pub transaction_id: TransactionId,

    /// Human readable reference such as `DEP-000000000042`
    pub reference: String,

    #[serde(rename = "transactionType")]
    pub tx_type: TransactionType,

    /// Always positive
    pub amount: Decimal,

    pub account_number: AccountNumber,

    /// Other account of a transfer half
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<AccountNumber>,

    /// Shared by both halves of a transfer and by their redo records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// Id of the record that first produced this effect
    ///
    /// Equal to `transaction_id` for fresh operations; redo records carry
    /// the origin of the command they re-apply.
    pub origin: TransactionId,

    /// For reversal records, the id of the record that was reversed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverses: Option<TransactionId>,

    pub description: String,

    pub status: TransactionStatus,

    /// Actor that requested the operation
    pub performed_by: String,

    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Contribution of this record to its account balance
    pub fn balance_contribution(&self) -> Decimal {
        if self.status == TransactionStatus::Completed {
            self.tx_type.signed_effect(self.amount)
        } else {
            Decimal::ZERO
        }
    }
}

/// Reference string for a record of the given type and id
pub fn format_reference(tx_type: TransactionType, id: TransactionId) -> String {
    format!("{}-{:012}", tx_type.reference_prefix(), id)
}
