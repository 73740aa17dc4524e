//! Core business logic module
//!
//! This module contains the ledger components:
//! - `ledger_store` - Account state storage
//! - `customer_store` - Customer directory
//! - `journal` - Append-only transaction records
//! - `commands` - Reversible commands
//! - `undo_redo` - Per-account undo/redo stacks
//! - `locks` - Per-account exclusive scopes
//! - `audit` - Audit trail
//! - `ledger_service` - Operation orchestration
//! - `sample_data` - Demo data seeding

pub mod audit;
pub mod commands;
pub mod customer_store;
pub mod journal;
pub mod ledger_service;
pub mod ledger_store;
pub mod locks;
pub mod sample_data;
pub mod undo_redo;

pub use audit::{AuditLogger, AuditSink, InMemoryAuditSink};
pub use commands::{Command, CommandKind};
pub use ledger_service::{LedgerConfig, LedgerService, LedgerSnapshot, StackEffect, StackOutcome};
pub use undo_redo::UndoRedoStatus;
