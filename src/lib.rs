//! Banking Ledger Library
//! # Overview
//!
//! This library provides an in-memory banking ledger served over HTTP, with
//! per-account undo/redo, an audit trail of every attempted operation and
//! one-way replication into a secondary store.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Customer, Transaction, AuditEntry, errors)
//! - [`cli`] - Server configuration from arguments and environment
//! - [`core`] - Business logic components:
//!   - [`core::ledger_service`] - Operation orchestration under per-account locks
//!   - [`core::journal`] - Append-only transaction records
//!   - [`core::undo_redo`] - Per-account undo/redo stacks of reversible commands
//!   - [`core::audit`] - Audit trail of successes and failures
//! - [`sync`] - Secondary-store replication and audit mirroring
//! - [`api`] - Axum router and handlers
//! - [`observability`] - Tracing subscriber setup
//!
//! # Operations
//!
//! - **Deposit**: Credit an ACTIVE account
//! - **Withdraw**: Debit an ACTIVE account (requires sufficient balance)
//! - **Transfer**: Debit one account and credit another as a single unit
//! - **Undo**: Reverse the most recent operation on an account; transfer
//!   halves are only reversed together
//! - **Redo**: Re-apply the most recently undone operation
//!
//! # Journal Identity
//!
//! For every account, the balance equals the signed sum of its COMPLETED
//! journal records. REVERSED records and their REVERSAL records both
//! contribute nothing.

// Module declarations
pub mod api;
pub mod cli;
pub mod core;
pub mod observability;
pub mod sync;
pub mod types;

pub use core::{AuditLogger, LedgerConfig, LedgerService};
pub use sync::{SyncConfig, Synchronizer};
pub use types::{
    Account, AccountNumber, AccountStatus, AccountType, AuditEntry, Customer, LedgerError,
    Transaction, TransactionId, TransactionStatus, TransactionType,
};
