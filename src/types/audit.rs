//! Audit trail types
//!
//! Entries are immutable once appended. Filters and statistics are computed
//! over the in-memory trail by [`crate::core::audit::AuditLogger`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Action names written to the trail
pub mod actions {
    pub const CREATE_CUSTOMER: &str = "CREATE_CUSTOMER";
    pub const CREATE_ACCOUNT: &str = "CREATE_ACCOUNT";
    pub const UPDATE_ACCOUNT_STATUS: &str = "UPDATE_ACCOUNT_STATUS";
    pub const DEPOSIT: &str = "DEPOSIT";
    pub const WITHDRAWAL: &str = "WITHDRAWAL";
    pub const TRANSFER: &str = "TRANSFER";
    pub const UNDO_TRANSACTION: &str = "UNDO_TRANSACTION";
    pub const REDO_TRANSACTION: &str = "REDO_TRANSACTION";
}

/// Entity type names written to the trail
pub mod entities {
    pub const CUSTOMER: &str = "CUSTOMER";
    pub const ACCOUNT: &str = "ACCOUNT";
    pub const TRANSACTION: &str = "TRANSACTION";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResult {
    Success,
    Failure,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "SUCCESS",
            AuditResult::Failure => "FAILURE",
        }
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Actor that requested the action
    pub user_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub result: AuditResult,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditEntry {
    pub fn new(
        user_id: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        result: AuditResult,
        description: impl Into<String>,
        error_message: Option<String>,
    ) -> Self {
        AuditEntry {
            action_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            result,
            description: description.into(),
            error_message,
        }
    }
}

/// Criteria for [`crate::core::audit::AuditLogger::query`]
///
/// Every `None` field matches all entries. `from` and `to` are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub result: Option<AuditResult>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.user_id.as_ref().map_or(true, |u| *u == entry.user_id)
            && self.action.as_ref().map_or(true, |a| *a == entry.action)
            && self
                .entity_type
                .as_ref()
                .map_or(true, |t| *t == entry.entity_type)
            && self.entity_id.as_ref().map_or(true, |i| *i == entry.entity_id)
            && self.result.map_or(true, |r| r == entry.result)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp <= to)
    }
}

/// Aggregate counts over the audit trail
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_logs: usize,
    pub success_logs: usize,
    pub failure_logs: usize,
    pub action_counts: BTreeMap<String, usize>,
    pub entity_type_counts: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn entry() -> AuditEntry {
        AuditEntry::new(
            "teller-1",
            actions::DEPOSIT,
            entities::TRANSACTION,
            "ACC1",
            AuditResult::Success,
            "Deposited 500",
            None,
        )
    }

    #[rstest]
    #[case::empty(AuditFilter::default(), true)]
    #[case::user(AuditFilter { user_id: Some("teller-1".into()), ..Default::default() }, true)]
    #[case::other_user(AuditFilter { user_id: Some("teller-2".into()), ..Default::default() }, false)]
    #[case::action(AuditFilter { action: Some("DEPOSIT".into()), ..Default::default() }, true)]
    #[case::failure_only(AuditFilter { result: Some(AuditResult::Failure), ..Default::default() }, false)]
    #[case::entity(
        AuditFilter { entity_type: Some("TRANSACTION".into()), entity_id: Some("ACC1".into()), ..Default::default() },
        true
    )]
    fn test_filter_matches(#[case] filter: AuditFilter, #[case] expected: bool) {
        assert_eq!(filter.matches(&entry()), expected);
    }

    #[test]
    fn test_filter_date_range_is_inclusive() {
        let entry = entry();
        let at = entry.timestamp;

        let inside = AuditFilter {
            from: Some(at),
            to: Some(at),
            ..Default::default()
        };
        let after = AuditFilter {
            from: Some(at + Duration::seconds(1)),
            ..Default::default()
        };

        assert!(inside.matches(&entry));
        assert!(!after.matches(&entry));
    }
}
