//! # Result Summary
//!
//! The failure taxonomy and the counters the scheduler reads back after an
//! invocation.
//!
//! ## Outcome Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pass Outcome → Counter                           │
//! │                                                                         │
//! │  PassOutcome::Succeeded(stats) ──► successes += 1, items += stats      │
//! │                                                                         │
//! │  PassOutcome::Failed(Auth)      ──► auth_failures += 1                 │
//! │  PassOutcome::Failed(Protocol)  ──► protocol_failures += 1             │
//! │  PassOutcome::Failed(Transport) ──► transport_failures += 1            │
//! │  PassOutcome::Failed(Storage)   ──► storage_failures += 1              │
//! │                                                                         │
//! │  Exactly one failure counter per failed pass, none per success.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ItemStats;

// =============================================================================
// Failure Category
// =============================================================================

/// The closed set of classified pass failures.
///
/// Anything a collaborator reports that fits none of these is a defect and
/// never reaches a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Remote rejected our credentials (HTTP 401).
    Auth,

    /// Remote answered, but not in a way the protocol allows (bad body, 4xx).
    Protocol,

    /// Network or server trouble (timeouts, resets, 5xx).
    Transport,

    /// Local collection store failed.
    Storage,
}

impl FailureCategory {
    /// All categories, in classification precedence order.
    pub const ALL: [FailureCategory; 4] = [
        FailureCategory::Auth,
        FailureCategory::Protocol,
        FailureCategory::Transport,
        FailureCategory::Storage,
    ];

    /// Hard failures need a change (credentials, server, device) before a
    /// retry can succeed. Transport failures are soft.
    pub fn is_hard(&self) -> bool {
        !matches!(self, FailureCategory::Transport)
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::Auth => write!(f, "auth"),
            FailureCategory::Protocol => write!(f, "protocol"),
            FailureCategory::Transport => write!(f, "transport"),
            FailureCategory::Storage => write!(f, "storage"),
        }
    }
}

// =============================================================================
// Pass Outcome
// =============================================================================

/// Result of one reconciliation pass over one collection pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Succeeded(ItemStats),
    Failed(FailureCategory),
}

// =============================================================================
// Result Summary
// =============================================================================

/// Aggregate outcome of one invocation.
///
/// Created empty when the invocation starts, filled by exactly one
/// accumulating task, and read by the scheduler afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub auth_failures: u64,
    pub protocol_failures: u64,
    pub transport_failures: u64,
    pub storage_failures: u64,

    /// Passes that completed without error.
    pub successes: u64,

    /// Item changes summed over all successful passes.
    pub items: ItemStats,

    /// When the last pair was attempted.
    pub completed_at: Option<DateTime<Utc>>,

    /// Suggested delay before the next attempt, set when only soft
    /// failures occurred.
    pub retry_after: Option<Duration>,
}

impl ResultSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one pass outcome into the counters.
    pub fn record(&mut self, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Succeeded(stats) => {
                self.successes += 1;
                self.items.absorb(stats);
            }
            PassOutcome::Failed(category) => self.record_failure(category),
        }
    }

    /// Increments the counter for `category`.
    pub fn record_failure(&mut self, category: FailureCategory) {
        match category {
            FailureCategory::Auth => self.auth_failures += 1,
            FailureCategory::Protocol => self.protocol_failures += 1,
            FailureCategory::Transport => self.transport_failures += 1,
            FailureCategory::Storage => self.storage_failures += 1,
        }
    }

    /// Returns the counter for `category`.
    pub fn count(&self, category: FailureCategory) -> u64 {
        match category {
            FailureCategory::Auth => self.auth_failures,
            FailureCategory::Protocol => self.protocol_failures,
            FailureCategory::Transport => self.transport_failures,
            FailureCategory::Storage => self.storage_failures,
        }
    }

    /// Sum of all failure counters.
    pub fn failures(&self) -> u64 {
        FailureCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }

    /// Number of passes folded into this summary.
    pub fn total_passes(&self) -> u64 {
        self.failures() + self.successes
    }

    /// Auth, protocol or storage failures.
    pub fn has_hard_error(&self) -> bool {
        self.auth_failures > 0 || self.protocol_failures > 0 || self.storage_failures > 0
    }

    /// Transport failures.
    pub fn has_soft_error(&self) -> bool {
        self.transport_failures > 0
    }

    pub fn has_error(&self) -> bool {
        self.has_hard_error() || self.has_soft_error()
    }

    /// True if the scheduler should prompt for new credentials rather than
    /// simply retry.
    pub fn needs_reauthentication(&self) -> bool {
        self.auth_failures > 0
    }

    /// True if local data was inaccessible (as opposed to the network).
    pub fn database_error(&self) -> bool {
        self.storage_failures > 0
    }

    /// Adds another summary's counters to this one.
    ///
    /// `completed_at` keeps the later timestamp, `retry_after` the longer delay.
    pub fn merge(&mut self, other: &ResultSummary) {
        self.auth_failures += other.auth_failures;
        self.protocol_failures += other.protocol_failures;
        self.transport_failures += other.transport_failures;
        self.storage_failures += other.storage_failures;
        self.successes += other.successes;
        self.items.absorb(other.items);
        self.completed_at = self.completed_at.max(other.completed_at);
        self.retry_after = self.retry_after.max(other.retry_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = ResultSummary::new();
        assert_eq!(summary.total_passes(), 0);
        assert!(!summary.has_error());
        assert!(!summary.needs_reauthentication());
    }

    #[test]
    fn test_each_failure_hits_one_counter() {
        for category in FailureCategory::ALL {
            let mut summary = ResultSummary::new();
            summary.record(PassOutcome::Failed(category));
            assert_eq!(summary.count(category), 1);
            assert_eq!(summary.failures(), 1);
            assert_eq!(summary.successes, 0);
        }
    }

    #[test]
    fn test_success_touches_no_failure_counter() {
        let mut summary = ResultSummary::new();
        summary.record(PassOutcome::Succeeded(ItemStats {
            inserted: 2,
            updated: 0,
            deleted: 1,
        }));
        assert_eq!(summary.failures(), 0);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.items.total(), 3);
    }

    #[test]
    fn test_auth_distinct_from_transport() {
        let mut summary = ResultSummary::new();
        summary.record_failure(FailureCategory::Auth);
        assert!(summary.needs_reauthentication());
        assert!(summary.has_hard_error());
        assert!(!summary.has_soft_error());

        let mut summary = ResultSummary::new();
        summary.record_failure(FailureCategory::Transport);
        assert!(!summary.needs_reauthentication());
        assert!(summary.has_soft_error());
        assert!(!summary.has_hard_error());
    }

    #[test]
    fn test_storage_is_database_error() {
        let mut summary = ResultSummary::new();
        summary.record_failure(FailureCategory::Storage);
        assert!(summary.database_error());
        assert!(FailureCategory::Storage.is_hard());
        assert!(!FailureCategory::Transport.is_hard());
    }

    #[test]
    fn test_merge() {
        let mut a = ResultSummary::new();
        a.record_failure(FailureCategory::Protocol);
        a.retry_after = Some(Duration::from_secs(1));

        let mut b = ResultSummary::new();
        b.record(PassOutcome::Succeeded(ItemStats::default()));
        b.record_failure(FailureCategory::Protocol);
        b.retry_after = Some(Duration::from_secs(5));

        a.merge(&b);
        assert_eq!(a.protocol_failures, 2);
        assert_eq!(a.successes, 1);
        assert_eq!(a.total_passes(), 3);
        assert_eq!(a.retry_after, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_serializes_camel_case() {
        let summary = ResultSummary::new();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"authFailures\":0"));
        assert!(json.contains("\"storageFailures\":0"));
    }
}
