//! Lifecycle policy and pass reports.

use serde::{Deserialize, Serialize};

/// Permit statuses under which a pending job may be scheduled for posting.
pub const DEFAULT_POSTABLE_PERMIT_STATUSES: [&str; 4] =
    ["Ready to Issue", "Issued", "Submitted", "In Review"];

/// Distinct unlocking users per trade token at which a job is retired.
pub const DEFAULT_UNLOCK_CAP: u32 = 5;

/// Exact-match allow-list of permit statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitStatusAllowList(Vec<String>);

impl PermitStatusAllowList {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(statuses.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, status: &str) -> bool {
        self.0.iter().any(|s| s == status)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PermitStatusAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_POSTABLE_PERMIT_STATUSES)
    }
}

/// Counts produced by one lifecycle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    /// Pending jobs posted because their anchor plus offset arrived.
    pub scheduled_posted: u64,
    /// Pending admin-approved jobs posted after their approval delay.
    pub approval_posted: u64,
    pub expired: u64,
    /// Jobs that were already expired before the pass and got deleted.
    pub deleted: u64,
    pub temp_documents_removed: u64,
}

impl TransitionReport {
    /// Number of status changes (deletions are not status changes).
    pub fn transitions(&self) -> u64 {
        self.scheduled_posted + self.approval_posted + self.expired
    }
}

/// Counts produced by one unlock-cap pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapReport {
    pub deleted: u64,
    pub completed: u64,
}

/// Outcome of a pass guarded by the single-runner lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome<R> {
    Ran(R),
    /// Another process held the lock; nothing was touched.
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let allowed = PermitStatusAllowList::default();
        assert!(allowed.contains("Issued"));
        assert!(allowed.contains("In Review"));
        assert!(!allowed.contains("issued"));
        assert!(!allowed.contains("Finaled"));
    }

    #[test]
    fn test_transition_count_ignores_deletes() {
        let report = TransitionReport {
            scheduled_posted: 1,
            approval_posted: 2,
            expired: 3,
            deleted: 10,
            temp_documents_removed: 4,
        };
        assert_eq!(report.transitions(), 6);
    }
}
