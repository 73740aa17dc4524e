//! Append-only audit trail
//!
//! The `AuditLogger` writes [`AuditEntry`] records through an [`AuditSink`]
//! and optionally forwards every accepted entry on a channel consumed by the
//! audit mirror (see [`crate::sync::audit_mirror`]).
//!
//! A sink that refuses a write surfaces as `LedgerError::AuditUnavailable`.
//! For successful operations the ledger service writes the entry before it
//! commits, so an operation that cannot be audited is never applied.

use crate::types::{AuditEntry, AuditFilter, AuditResult, AuditStats, LedgerError};
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Storage backend for audit entries
pub trait AuditSink: Send + Sync + fmt::Debug {
    /// Append one entry
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry is durably queued
    /// * `Err(LedgerError::AuditUnavailable)` - The entry was not stored
    fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError>;

    /// Every stored entry in append order
    fn entries(&self) -> Vec<AuditEntry>;
}

/// In-memory sink with an optional capacity
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
    capacity: Option<usize>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that refuses writes once `capacity` entries are stored
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            capacity: Some(capacity),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: &AuditEntry) -> Result<(), LedgerError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| LedgerError::audit_unavailable("audit store lock poisoned"))?;
        if let Some(capacity) = self.capacity {
            if entries.len() >= capacity {
                return Err(LedgerError::audit_unavailable(format!(
                    "audit store is full ({} entries)",
                    capacity
                )));
            }
        }
        entries.push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Audit trail facade used by the ledger service and the HTTP layer
#[derive(Debug, Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    mirror: Option<UnboundedSender<AuditEntry>>,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryAuditSink::new()))
    }
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink, mirror: None }
    }

    /// Forward every accepted entry to `sender`
    pub fn with_mirror(mut self, sender: UnboundedSender<AuditEntry>) -> Self {
        self.mirror = Some(sender);
        self
    }

    /// Append an entry
    ///
    /// The mirror is fed only after the sink accepted the entry. A closed
    /// mirror channel does not fail the write.
    pub fn record(&self, entry: AuditEntry) -> Result<AuditEntry, LedgerError> {
        self.sink.append(&entry)?;
        debug!(
            action = %entry.action,
            entity_id = %entry.entity_id,
            user_id = %entry.user_id,
            result = entry.result.as_str(),
            "Audit entry recorded"
        );
        if let Some(mirror) = &self.mirror {
            if mirror.send(entry.clone()).is_err() {
                debug!("Audit mirror channel closed, entry not forwarded");
            }
        }
        Ok(entry)
    }

    /// Append a SUCCESS entry
    pub fn success(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        description: impl Into<String>,
    ) -> Result<AuditEntry, LedgerError> {
        self.record(AuditEntry::new(
            actor,
            action,
            entity_type,
            entity_id,
            AuditResult::Success,
            description,
            None,
        ))
    }

    /// Append a FAILURE entry for a rejected operation
    ///
    /// Infrastructure errors are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The entry was stored, or `error` is not audited
    /// * `Err(LedgerError::AuditUnavailable)` - The sink refused the entry;
    ///   the message names both the sink failure and `error`
    pub fn failure(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        description: impl Into<String>,
        error: &LedgerError,
    ) -> Result<(), LedgerError> {
        if !error.is_audited() {
            return Ok(());
        }
        let entry = AuditEntry::new(
            actor,
            action,
            entity_type,
            entity_id,
            AuditResult::Failure,
            description,
            Some(error.to_string()),
        );
        self.record(entry).map(|_| ()).map_err(|audit_error| {
            warn!(%action, %entity_id, error = %audit_error, "Failed to record audit failure entry");
            LedgerError::audit_unavailable(format!(
                "FAILURE entry for {} on {} not recorded ({}); operation error: {}",
                action, entity_id, audit_error, error
            ))
        })
    }

    /// Entries matching `filter`, newest first, truncated to `filter.limit`
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let matching = self
            .sink
            .entries()
            .into_iter()
            .rev()
            .filter(|entry| filter.matches(entry));
        match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    /// Every entry in append order
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.sink.entries()
    }

    pub fn stats(&self) -> AuditStats {
        let mut stats = AuditStats::default();
        for entry in self.sink.entries() {
            stats.total_logs += 1;
            match entry.result {
                AuditResult::Success => stats.success_logs += 1,
                AuditResult::Failure => stats.failure_logs += 1,
            }
            *stats.action_counts.entry(entry.action).or_insert(0) += 1;
            *stats.entity_type_counts.entry(entry.entity_type).or_insert(0) += 1;
        }
        stats
    }
}
