//! Replication into a secondary store
//!
//! - `secondary` - Store abstraction with in-memory and CSV directory backends
//! - `synchronizer` - Single-flight snapshot replication with retries
//! - `audit_mirror` - Background forwarding of audit entries

pub mod audit_mirror;
pub mod secondary;
pub mod synchronizer;

pub use audit_mirror::spawn_audit_mirror;
pub use secondary::{tables, CsvSecondaryStore, InMemorySecondaryStore, SecondaryItem, SecondaryStore};
pub use synchronizer::{SyncConfig, SyncStatus, Synchronizer};
