//! Error types for the banking ledger
//!
//! This module defines every error the ledger can report to a caller and the
//! error type used by secondary stores.
//!
//! # Error Categories
//!
//! Each [`LedgerError`] variant belongs to exactly one [`ErrorKind`]:
//!
//! - **Validation**: non-positive amounts, same-account transfers, malformed input
//! - **NotFound**: unknown accounts or customers
//! - **State**: inactive accounts, empty undo/redo stacks, partial reversals
//! - **InsufficientFunds**: a debit larger than the balance
//! - **Concurrency**: an account lock could not be acquired in time
//! - **SyncInProgress**: a synchronization pass is already running
//! - **Infrastructure**: the audit sink or secondary store failed

use super::account::AccountStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a [`LedgerError`]
///
/// The HTTP layer maps kinds to status codes and the ledger service uses the
/// kind to decide whether a failure is audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    State,
    InsufficientFunds,
    Concurrency,
    SyncInProgress,
    Infrastructure,
}

impl ErrorKind {
    /// Machine readable code used in error responses
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::State => "state_error",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Concurrency => "concurrency_error",
            ErrorKind::SyncInProgress => "sync_in_progress",
            ErrorKind::Infrastructure => "infrastructure_error",
        }
    }
}

/// Main error type for the banking ledger
///
/// Each variant includes the context needed to explain the failure to an
/// API client and to write a meaningful audit entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("Amount must be greater than zero, got {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Transfer source and destination are the same account
    #[error("Cannot transfer from account {account_number} to itself")]
    SameAccount { account_number: String },

    /// A request field could not be interpreted
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending field
        field: String,
        /// Description of the problem
        message: String,
    },

    #[error("Account not found: {account_number}")]
    AccountNotFound { account_number: String },

    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: String },

    /// Account exists but is not ACTIVE
    ///
    /// Monetary operations, undo and redo are all refused.
    #[error("Account {account_number} is not active (status: {status})")]
    AccountNotActive {
        account_number: String,
        /// Current status of the account
        status: AccountStatus,
    },

    #[error("No transactions to undo for account {account_number}")]
    NothingToUndo { account_number: String },

    #[error("No transactions to redo for account {account_number}")]
    NothingToRedo { account_number: String },

    /// Reversing one half of a transfer on its own is refused
    ///
    /// Raised when `include_linked` is false, or when the linked half is not
    /// on top of the counterparty's stack.
    #[error("Cannot {operation} one side of transfer between {account_number} and {counterparty}: {reason}")]
    PartialReversalNotAllowed {
        /// Account the request targeted
        account_number: String,
        /// Account holding the linked half
        counterparty: String,
        /// "undo" or "redo"
        operation: String,
        /// Why the pair could not be processed together
        reason: String,
    },

    /// Debit larger than the current balance
    ///
    /// The account state remains unchanged.
    #[error(
        "Insufficient funds in account {account_number}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        account_number: String,
        /// Balance at the time of the check
        available: Decimal,
        /// Requested debit
        requested: Decimal,
    },

    /// Decimal arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account_number}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        account_number: String,
    },

    /// An account lock was not acquired within the configured timeout
    ///
    /// Nothing was changed, so the caller may retry.
    #[error("Timed out after {timeout_ms}ms waiting for lock on account {account_number}")]
    LockTimeout {
        account_number: String,
        timeout_ms: u64,
    },

    #[error("A synchronization is already in progress")]
    SyncInProgress,

    /// The audit sink refused an entry
    ///
    /// The operation that produced the entry was not committed.
    #[error("Audit log unavailable: {message}")]
    AuditUnavailable { message: String },

    #[error("Secondary store error: {0}")]
    SecondaryStore(#[from] StoreError),
}

impl LedgerError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. }
            | LedgerError::SameAccount { .. }
            | LedgerError::InvalidInput { .. }
            | LedgerError::ArithmeticOverflow { .. } => ErrorKind::Validation,
            LedgerError::AccountNotFound { .. } | LedgerError::CustomerNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::AccountNotActive { .. }
            | LedgerError::NothingToUndo { .. }
            | LedgerError::NothingToRedo { .. }
            | LedgerError::PartialReversalNotAllowed { .. } => ErrorKind::State,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::LockTimeout { .. } => ErrorKind::Concurrency,
            LedgerError::SyncInProgress => ErrorKind::SyncInProgress,
            LedgerError::AuditUnavailable { .. } | LedgerError::SecondaryStore(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Whether the failure is recorded in the audit trail
    ///
    /// Infrastructure failures are logged but never written as a business
    /// FAILURE entry.
    pub fn is_audited(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create a SameAccount error
    pub fn same_account(account_number: &str) -> Self {
        LedgerError::SameAccount {
            account_number: account_number.to_string(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account_number: &str) -> Self {
        LedgerError::AccountNotFound {
            account_number: account_number.to_string(),
        }
    }

    /// Create a CustomerNotFound error
    pub fn customer_not_found(customer_id: &str) -> Self {
        LedgerError::CustomerNotFound {
            customer_id: customer_id.to_string(),
        }
    }

    /// Create an AccountNotActive error
    pub fn account_not_active(account_number: &str, status: AccountStatus) -> Self {
        LedgerError::AccountNotActive {
            account_number: account_number.to_string(),
            status,
        }
    }

    /// Create a NothingToUndo error
    pub fn nothing_to_undo(account_number: &str) -> Self {
        LedgerError::NothingToUndo {
            account_number: account_number.to_string(),
        }
    }

    /// Create a NothingToRedo error
    pub fn nothing_to_redo(account_number: &str) -> Self {
        LedgerError::NothingToRedo {
            account_number: account_number.to_string(),
        }
    }

    /// Create a PartialReversalNotAllowed error
    pub fn partial_reversal(
        account_number: &str,
        counterparty: &str,
        operation: &str,
        reason: &str,
    ) -> Self {
        LedgerError::PartialReversalNotAllowed {
            account_number: account_number.to_string(),
            counterparty: counterparty.to_string(),
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account_number: &str, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account_number: account_number.to_string(),
            available,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account_number: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account_number: account_number.to_string(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account_number: &str, timeout_ms: u64) -> Self {
        LedgerError::LockTimeout {
            account_number: account_number.to_string(),
            timeout_ms,
        }
    }

    /// Create an AuditUnavailable error
    pub fn audit_unavailable(message: impl Into<String>) -> Self {
        LedgerError::AuditUnavailable {
            message: message.into(),
        }
    }
}

/// Error reported by a secondary store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// I/O failure while reading or writing a table
    #[error("I/O error on table {table}: {message}")]
    Io { table: String, message: String },

    /// A table file could not be parsed or written as CSV
    #[error("CSV error on table {table}: {message}")]
    Csv { table: String, message: String },

    /// The store refused the write
    #[error("Store unavailable for table {table}: {message}")]
    Unavailable { table: String, message: String },
}

impl StoreError {
    pub fn io(table: &str, error: std::io::Error) -> Self {
        StoreError::Io {
            table: table.to_string(),
            message: error.to_string(),
        }
    }

    pub fn csv(table: &str, error: csv::Error) -> Self {
        StoreError::Csv {
            table: table.to_string(),
            message: error.to_string(),
        }
    }

    pub fn unavailable(table: &str, message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { amount: Decimal::new(-5, 0) },
        "Amount must be greater than zero, got -5"
    )]
    #[case::same_account(
        LedgerError::same_account("ACC1"),
        "Cannot transfer from account ACC1 to itself"
    )]
    #[case::account_not_found(
        LedgerError::account_not_found("ACC9"),
        "Account not found: ACC9"
    )]
    #[case::account_not_active(
        LedgerError::account_not_active("ACC1", AccountStatus::Frozen),
        "Account ACC1 is not active (status: FROZEN)"
    )]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds("ACC1", Decimal::new(150000, 2), Decimal::new(200000, 2)),
        "Insufficient funds in account ACC1: available 1500.00, requested 2000.00"
    )]
    #[case::partial_reversal(
        LedgerError::partial_reversal("ACC1", "ACC2", "undo", "linked transfer requires includeLinked"),
        "Cannot undo one side of transfer between ACC1 and ACC2: linked transfer requires includeLinked"
    )]
    #[case::lock_timeout(
        LedgerError::lock_timeout("ACC1", 250),
        "Timed out after 250ms waiting for lock on account ACC1"
    )]
    #[case::secondary_store(
        LedgerError::from(StoreError::unavailable("BankingAccounts", "offline")),
        "Secondary store error: Store unavailable for table BankingAccounts: offline"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_amount(LedgerError::invalid_amount(Decimal::ZERO), ErrorKind::Validation)]
    #[case::overflow(LedgerError::arithmetic_overflow("deposit", "ACC1"), ErrorKind::Validation)]
    #[case::customer(LedgerError::customer_not_found("c-1"), ErrorKind::NotFound)]
    #[case::nothing_to_undo(LedgerError::nothing_to_undo("ACC1"), ErrorKind::State)]
    #[case::nothing_to_redo(LedgerError::nothing_to_redo("ACC1"), ErrorKind::State)]
    #[case::funds(
        LedgerError::insufficient_funds("ACC1", Decimal::ONE, Decimal::TWO),
        ErrorKind::InsufficientFunds
    )]
    #[case::lock(LedgerError::lock_timeout("ACC1", 10), ErrorKind::Concurrency)]
    #[case::sync(LedgerError::SyncInProgress, ErrorKind::SyncInProgress)]
    #[case::audit(LedgerError::audit_unavailable("full"), ErrorKind::Infrastructure)]
    fn test_error_kind(#[case] error: LedgerError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn test_infrastructure_errors_are_not_audited() {
        assert!(!LedgerError::audit_unavailable("down").is_audited());
        assert!(LedgerError::nothing_to_undo("ACC1").is_audited());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error = StoreError::io("BankingCustomers", io_error);
        assert_eq!(
            error.to_string(),
            "I/O error on table BankingCustomers: Permission denied"
        );
    }
}
