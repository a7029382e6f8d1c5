//! Operation counters
//!
//! Counters only, monotonic, reset on process start. Relaxed atomics: the
//! values are exact once all operations have returned.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for the note engine
#[derive(Debug, Default)]
pub struct NoteMetrics {
    notes_created: AtomicU64,
    notes_updated: AtomicU64,
    notes_renamed: AtomicU64,
    notes_deleted: AtomicU64,
    operations_rejected: AtomicU64,
    scans: AtomicU64,
    slots_skipped: AtomicU64,
    lamports_refunded: AtomicU64,
}

impl NoteMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_created(&self) {
        self.notes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updated(&self) {
        self.notes_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// A rename also counts as an update
    pub fn increment_renamed(&self) {
        self.notes_renamed.fetch_add(1, Ordering::Relaxed);
        self.increment_updated();
    }

    pub fn record_deleted(&self, refunded: u64) {
        self.notes_deleted.fetch_add(1, Ordering::Relaxed);
        self.lamports_refunded.fetch_add(refunded, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.operations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_scans(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.slots_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            notes_created: self.notes_created.load(Ordering::Relaxed),
            notes_updated: self.notes_updated.load(Ordering::Relaxed),
            notes_renamed: self.notes_renamed.load(Ordering::Relaxed),
            notes_deleted: self.notes_deleted.load(Ordering::Relaxed),
            operations_rejected: self.operations_rejected.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            slots_skipped: self.slots_skipped.load(Ordering::Relaxed),
            lamports_refunded: self.lamports_refunded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub notes_created: u64,
    pub notes_updated: u64,
    pub notes_renamed: u64,
    pub notes_deleted: u64,
    pub operations_rejected: u64,
    pub scans: u64,
    pub slots_skipped: u64,
    pub lamports_refunded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(NoteMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_rename_counts_as_update() {
        let metrics = NoteMetrics::new();
        metrics.increment_updated();
        metrics.increment_renamed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notes_updated, 2);
        assert_eq!(snapshot.notes_renamed, 1);
    }

    #[test]
    fn test_refunds_accumulate() {
        let metrics = NoteMetrics::new();
        metrics.record_deleted(100);
        metrics.record_deleted(50);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notes_deleted, 2);
        assert_eq!(snapshot.lamports_refunded, 150);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(NoteMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.increment_created();
                        metrics.increment_rejected();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.notes_created, 800);
        assert_eq!(snapshot.operations_rejected, 800);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = NoteMetrics::new();
        metrics.increment_scans();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["scans"], 1);
    }
}
