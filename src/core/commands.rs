//! Reversible commands
//!
//! A [`Command`] captures everything needed to re-apply or reverse one
//! monetary effect on one account. Transfers produce two commands, one per
//! account, linked by a correlation id.

use crate::types::{AccountNumber, Transaction, TransactionId, TransactionType};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Kind of effect a command re-applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
}

impl CommandKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            CommandKind::Deposit => TransactionType::Deposit,
            CommandKind::Withdraw => TransactionType::Withdraw,
            CommandKind::TransferOut => TransactionType::TransferOut,
            CommandKind::TransferIn => TransactionType::TransferIn,
        }
    }

    fn complement(&self) -> Option<CommandKind> {
        match self {
            CommandKind::TransferOut => Some(CommandKind::TransferIn),
            CommandKind::TransferIn => Some(CommandKind::TransferOut),
            CommandKind::Deposit | CommandKind::Withdraw => None,
        }
    }
}

/// Immutable record of a reversible effect on one account
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub account_number: AccountNumber,
    pub kind: CommandKind,
    pub amount: Decimal,
    /// Id of the transaction that first produced the effect
    pub origin: TransactionId,
    pub correlation_id: Option<Uuid>,
    pub counterparty: Option<AccountNumber>,
}

impl Command {
    /// Build the command for a freshly journaled record
    ///
    /// # Returns
    ///
    /// `None` for reversal records, which are never recorded as commands
    pub fn for_transaction(tx: &Transaction) -> Option<Self> {
        let kind = match tx.tx_type {
            TransactionType::Deposit => CommandKind::Deposit,
            TransactionType::Withdraw => CommandKind::Withdraw,
            TransactionType::TransferOut => CommandKind::TransferOut,
            TransactionType::TransferIn => CommandKind::TransferIn,
            TransactionType::Reversal => return None,
        };
        Some(Command {
            account_number: tx.account_number.clone(),
            kind,
            amount: tx.amount,
            origin: tx.origin,
            correlation_id: tx.correlation_id,
            counterparty: tx.counterparty.clone(),
        })
    }

    /// Balance change applied by redo
    pub fn apply_delta(&self) -> Decimal {
        match self.kind {
            CommandKind::Deposit | CommandKind::TransferIn => self.amount,
            CommandKind::Withdraw | CommandKind::TransferOut => -self.amount,
        }
    }

    /// Balance change applied by undo
    pub fn inverse_delta(&self) -> Decimal {
        -self.apply_delta()
    }

    pub fn is_transfer_half(&self) -> bool {
        self.kind.complement().is_some()
    }

    /// Whether `other` is the opposite half of the same transfer
    pub fn is_linked_to(&self, other: &Command) -> bool {
        self.kind.complement() == Some(other.kind)
            && self.correlation_id.is_some()
            && self.correlation_id == other.correlation_id
            && self.counterparty.as_deref() == Some(other.account_number.as_str())
            && other.counterparty.as_deref() == Some(self.account_number.as_str())
    }

    /// Human readable label used in audit descriptions
    pub fn label(&self) -> &'static str {
        match self.kind {
            CommandKind::Deposit => "deposit",
            CommandKind::Withdraw => "withdrawal",
            CommandKind::TransferOut => "transfer out",
            CommandKind::TransferIn => "transfer in",
        }
    }
}
