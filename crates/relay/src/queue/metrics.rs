use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Queue counters for monitoring and UI badges.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub total_enqueued: AtomicU64,
    pub total_replayed: AtomicU64,
    pub total_completed: AtomicU64,
    pub failed_attempts: AtomicU64,
    pub total_exhausted: AtomicU64,
    pub current_size: AtomicUsize,
    pub queue_depth_max: AtomicUsize,
    pub persistence_operations: AtomicU64,
    pub persistence_failures: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueue(&self) {
        self.total_enqueued.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record the start of one replay attempt.
    pub fn record_replay(&self) {
        self.total_replayed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.total_completed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.total_exhausted.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_persistence(&self, success: bool) {
        self.persistence_operations.fetch_add(1, AtomicOrdering::Relaxed);
        if !success {
            self.persistence_failures.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    pub fn update_size(&self, size: usize) {
        self.current_size.store(size, AtomicOrdering::Relaxed);

        let mut max = self.queue_depth_max.load(AtomicOrdering::Relaxed);
        while size > max {
            match self.queue_depth_max.compare_exchange_weak(
                max,
                size,
                AtomicOrdering::Relaxed,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => max = observed,
            }
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            total_enqueued: self.total_enqueued.load(AtomicOrdering::Relaxed),
            total_replayed: self.total_replayed.load(AtomicOrdering::Relaxed),
            total_completed: self.total_completed.load(AtomicOrdering::Relaxed),
            failed_attempts: self.failed_attempts.load(AtomicOrdering::Relaxed),
            total_exhausted: self.total_exhausted.load(AtomicOrdering::Relaxed),
            current_size: self.current_size.load(AtomicOrdering::Relaxed),
            queue_depth_max: self.queue_depth_max.load(AtomicOrdering::Relaxed),
            persistence_operations: self.persistence_operations.load(AtomicOrdering::Relaxed),
            persistence_failures: self.persistence_failures.load(AtomicOrdering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetricsSnapshot {
    pub total_enqueued: u64,
    pub total_replayed: u64,
    pub total_completed: u64,
    pub failed_attempts: u64,
    pub total_exhausted: u64,
    pub current_size: usize,
    pub queue_depth_max: usize,
    pub persistence_operations: u64,
    pub persistence_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_max_tracks_high_water_mark() {
        let metrics = QueueMetrics::new();

        metrics.update_size(3);
        metrics.update_size(7);
        metrics.update_size(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.current_size, 2);
        assert_eq!(snapshot.queue_depth_max, 7);
    }

    #[test]
    fn test_persistence_failure_counts_both() {
        let metrics = QueueMetrics::new();

        metrics.record_persistence(true);
        metrics.record_persistence(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.persistence_operations, 2);
        assert_eq!(snapshot.persistence_failures, 1);
    }
}
