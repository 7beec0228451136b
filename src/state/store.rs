use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::monitor::RefreshOutcome;
use crate::quota::QuotaRecord;

/// Shared store type alias
pub type SharedStore = Arc<QuotaStore>;

/// Owned, display-ready view of the current quota state.
///
/// Cloned out of the locked state so callers never hold the lock; repeated
/// calls without an intervening refresh return identical records.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotView {
    /// Last successful snapshot, in server response order
    pub records: Vec<QuotaRecord>,
    /// Seconds until the next scheduled refresh
    pub countdown_seconds: u64,
    /// A refresh is currently in flight
    pub is_loading: bool,
    /// No data has ever been obtained and the last attempt failed
    pub is_error: bool,
}

#[derive(Debug)]
struct StoreInner {
    /// Last snapshot with at least one record; empty if none ever succeeded
    snapshot: Vec<QuotaRecord>,
    /// Set only while the snapshot is empty; stale data never carries an
    /// error badge
    last_error: bool,
    /// In-flight guard; concurrent refresh triggers are no-ops, not queued
    refreshing: bool,
    /// When the next automatic refresh should fire
    next_deadline: Instant,
}

/// Process-wide quota cache and refresh state machine.
///
/// Mutated only through [`begin_refresh`](QuotaStore::begin_refresh) and
/// [`complete_refresh`](QuotaStore::complete_refresh); everything else is a
/// read.
#[derive(Debug)]
pub struct QuotaStore {
    refresh_interval: Duration,
    inner: RwLock<StoreInner>,
}

impl QuotaStore {
    /// Create a store whose first refresh is due immediately.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            inner: RwLock::new(StoreInner {
                snapshot: Vec::new(),
                last_error: false,
                refreshing: false,
                next_deadline: Instant::now(),
            }),
        }
    }

    /// Create a shared store
    pub fn shared(refresh_interval: Duration) -> SharedStore {
        Arc::new(Self::new(refresh_interval))
    }

    /// Try to claim the in-flight guard for a refresh attempt.
    ///
    /// Returns false when a refresh is already running; the caller must not
    /// proceed. On success the next deadline is advanced immediately, so a
    /// slow or hung attempt cannot push the schedule out by more than one
    /// interval.
    pub fn begin_refresh(&self) -> bool {
        let mut inner = self.inner.write();
        if inner.refreshing {
            return false;
        }
        inner.refreshing = true;
        inner.next_deadline = Instant::now() + self.refresh_interval;
        true
    }

    /// Record the outcome of a refresh attempt and release the guard.
    ///
    /// Only an outcome with at least one record replaces the snapshot; a
    /// zero-record outcome (failed or successfully empty) leaves previously
    /// cached data in place, and flags an error only when there is no
    /// cached data to fall back on.
    pub fn complete_refresh(&self, outcome: RefreshOutcome) {
        let mut inner = self.inner.write();
        if !outcome.records.is_empty() {
            debug!(count = outcome.records.len(), "snapshot replaced");
            inner.snapshot = outcome.records;
            inner.last_error = false;
        } else if inner.snapshot.is_empty() {
            inner.last_error = true;
        }
        inner.refreshing = false;
    }

    /// Whether the automatic refresh deadline has elapsed.
    pub fn is_due(&self) -> bool {
        let inner = self.inner.read();
        !inner.refreshing && Instant::now() >= inner.next_deadline
    }

    /// Current display-ready view.
    pub fn view(&self) -> SnapshotView {
        let inner = self.inner.read();
        SnapshotView {
            records: inner.snapshot.clone(),
            countdown_seconds: inner
                .next_deadline
                .saturating_duration_since(Instant::now())
                .as_secs(),
            is_loading: inner.refreshing,
            is_error: inner.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(label: &str) -> QuotaRecord {
        QuotaRecord {
            label: label.to_string(),
            remaining_fraction: 0.5,
            reset_time: None,
        }
    }

    fn success(labels: &[&str]) -> RefreshOutcome {
        RefreshOutcome {
            records: labels.iter().map(|l| record(l)).collect(),
            succeeded: true,
        }
    }

    #[test]
    fn test_initial_state_is_empty_and_due() {
        let store = QuotaStore::new(Duration::from_secs(60));
        let view = store.view();
        assert!(view.records.is_empty());
        assert!(!view.is_loading);
        assert!(!view.is_error);
        assert!(store.is_due());
    }

    #[test]
    fn test_success_populates_snapshot() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A"]));

        let view = store.view();
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].label, "Model A");
        assert!(!view.is_error);
        assert!(!view.is_loading);
    }

    #[test]
    fn test_guard_blocks_concurrent_refresh() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        assert!(!store.begin_refresh());
        assert!(store.view().is_loading);

        store.complete_refresh(RefreshOutcome::failed());
        assert!(store.begin_refresh());
    }

    #[test]
    fn test_failure_on_empty_cache_sets_error() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(RefreshOutcome::failed());

        let view = store.view();
        assert!(view.records.is_empty());
        assert!(view.is_error);
    }

    #[test]
    fn test_stale_data_preferred_over_failure() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A"]));

        assert!(store.begin_refresh());
        store.complete_refresh(RefreshOutcome::failed());

        let view = store.view();
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].label, "Model A");
        // Prior success still counts as non-error
        assert!(!view.is_error);
    }

    #[test]
    fn test_empty_success_does_not_clear_cache() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A"]));

        assert!(store.begin_refresh());
        store.complete_refresh(success(&[]));

        let view = store.view();
        assert_eq!(view.records.len(), 1);
        assert!(!view.is_error);
    }

    #[test]
    fn test_success_clears_prior_error() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(RefreshOutcome::failed());
        assert!(store.view().is_error);

        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A"]));
        assert!(!store.view().is_error);
    }

    #[test]
    fn test_view_is_idempotent() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A", "Model B"]));

        let first = store.view();
        let second = store.view();
        assert_eq!(first.records, second.records);
        assert_eq!(first.is_error, second.is_error);
    }

    #[test]
    fn test_deadline_advances_at_attempt_start() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.is_due());

        assert!(store.begin_refresh());
        // Deadline moved before completion; a hung attempt cannot delay
        // the schedule past one interval.
        assert!(!store.is_due());
        let countdown = store.view().countdown_seconds;
        assert!(countdown > 50 && countdown <= 60);

        store.complete_refresh(RefreshOutcome::failed());
        assert!(!store.is_due());
    }

    #[test]
    fn test_snapshot_replaced_atomically() {
        let store = QuotaStore::new(Duration::from_secs(60));
        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model A", "Model B"]));

        assert!(store.begin_refresh());
        store.complete_refresh(success(&["Model C"]));

        let view = store.view();
        let labels: Vec<&str> = view.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Model C"]);
    }
}
