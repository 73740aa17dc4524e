//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account records, types and statuses
//! - `customer`: Customer records
//! - `transaction`: Journal records and identifiers
//! - `audit`: Audit entries, filters and statistics
//! - `error`: Error types for the ledger and secondary stores

pub mod account;
pub mod audit;
pub mod customer;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountNumber, AccountStatus, AccountType};
pub use audit::{AuditEntry, AuditFilter, AuditResult, AuditStats};
pub use customer::{Customer, CustomerId, CustomerProfile};
pub use error::{ErrorKind, LedgerError, StoreError};
pub use transaction::{Transaction, TransactionId, TransactionStatus, TransactionType};
