use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::errors::{QueueError, QueueResult};
use super::metrics::{QueueMetrics, QueueMetricsSnapshot};
use super::types::{QueuedRequest, QueuedRequestInput};
use crate::config::RelayConfig;
use crate::transport::Method;

/// Summary published to UI badges and the persistence task.
#[derive(Debug, Clone, Default)]
pub struct QueueStatus {
    pub count: usize,
    /// Snapshot in drain order.
    pub requests: Vec<QueuedRequest>,
}

/// Outcome of recording a failed replay attempt.
#[derive(Debug)]
pub enum RetryDisposition {
    /// The request stays queued and becomes eligible again at the given
    /// time.
    Rescheduled { next_attempt_at: DateTime<Utc> },
    /// The request hit its attempt limit and was removed. The purged entry
    /// is returned so the caller can report the permanent failure.
    Exhausted(QueuedRequest),
}

/// Ordered collection of deferred requests.
///
/// The store exclusively owns the pending entries; the executor and the
/// processor only read and mutate through this API, so no duplicate copy
/// can diverge and drains never observe torn state.
///
/// Mutations publish a [`QueueStatus`] through a watch channel; consumers
/// that used to poll for badge counts subscribe instead.
pub struct RequestQueueStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<StoreState>,
    metrics: Arc<QueueMetrics>,
    status_tx: watch::Sender<QueueStatus>,
    default_max_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

struct StoreState {
    items: HashMap<String, QueuedRequest>,
    sequence: u64,
}

impl RequestQueueStore {
    /// Create an empty store using the relay's retry defaults.
    pub fn new(config: &RelayConfig) -> Self {
        let (status_tx, _status_rx) = watch::channel(QueueStatus::default());

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState { items: HashMap::new(), sequence: 0 }),
                metrics: Arc::new(QueueMetrics::new()),
                status_tx,
                default_max_attempts: config.default_max_attempts,
                base_backoff: config.base_backoff,
                max_backoff: config.max_backoff,
            }),
        }
    }

    /// Insert a request, assigning a unique id and a FIFO sequence within
    /// its priority band. Never fails; the queue is bounded only by
    /// memory.
    #[instrument(skip(self, input), fields(url = %input.request.url, priority = %input.priority))]
    pub fn enqueue(&self, input: QueuedRequestInput) -> String {
        let request = {
            let mut state = self.inner.state.write();
            let sequence = state.sequence;
            state.sequence += 1;

            let request = QueuedRequest {
                id: uuid::Uuid::new_v4().to_string(),
                request: input.request,
                priority: input.priority,
                attempt: 0,
                max_attempts: input.max_attempts.unwrap_or(self.inner.default_max_attempts),
                description: input.description,
                created_at: Utc::now(),
                next_attempt_at: None,
                last_error: None,
                sequence,
            };

            state.items.insert(request.id.clone(), request.clone());
            self.inner.metrics.record_enqueue();
            self.inner.metrics.update_size(state.items.len());
            request
        };

        self.publish_status();

        debug!(id = %request.id, "request queued for replay");
        request.id
    }

    /// Remove by id. A no-op (not an error) when the id is absent, so
    /// repeated removal is idempotent.
    pub fn dequeue(&self, id: &str) -> Option<QueuedRequest> {
        let removed = {
            let mut state = self.inner.state.write();
            let removed = state.items.remove(id);
            if removed.is_some() {
                self.inner.metrics.update_size(state.items.len());
            }
            removed
        };

        if removed.is_some() {
            self.publish_status();
            debug!(id, "request dequeued");
        }

        removed
    }

    /// Remove an entry that replayed successfully.
    pub(crate) fn complete(&self, id: &str) -> Option<QueuedRequest> {
        let removed = self.dequeue(id);
        if removed.is_some() {
            self.inner.metrics.record_completed();
        }
        removed
    }

    /// Record one failed replay attempt.
    ///
    /// Increments the attempt counter; entries at their limit are removed
    /// and returned as [`RetryDisposition::Exhausted`], others get a
    /// backoff gate and stay queued.
    pub fn record_attempt(&self, id: &str, error: Option<String>) -> QueueResult<RetryDisposition> {
        let disposition = {
            let mut state = self.inner.state.write();
            let item =
                state.items.get_mut(id).ok_or_else(|| QueueError::NotFound(id.to_string()))?;

            item.attempt += 1;
            item.last_error = error;

            if item.attempt >= item.max_attempts {
                let removed =
                    state.items.remove(id).ok_or_else(|| QueueError::NotFound(id.to_string()))?;
                self.inner.metrics.record_exhausted();
                self.inner.metrics.update_size(state.items.len());
                warn!(id, attempts = removed.attempt, "request exhausted its attempt limit");
                RetryDisposition::Exhausted(removed)
            } else {
                let delay = item.backoff_delay(self.inner.base_backoff, self.inner.max_backoff);
                let next_attempt_at = Utc::now()
                    + chrono::Duration::milliseconds(
                        i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
                    );
                item.next_attempt_at = Some(next_attempt_at);
                self.inner.metrics.record_failed_attempt();
                debug!(id, attempt = item.attempt, %next_attempt_at, "request rescheduled");
                RetryDisposition::Rescheduled { next_attempt_at }
            }
        };

        self.publish_status();
        Ok(disposition)
    }

    /// Snapshot ordered by priority band (high, medium, low), FIFO within
    /// a band.
    pub fn list(&self) -> Vec<QueuedRequest> {
        let state = self.inner.state.read();
        let mut items: Vec<QueuedRequest> = state.items.values().cloned().collect();
        items.sort_by_key(|item| (item.priority, item.sequence));
        items
    }

    /// Id of a queued entry with the same url and method, if any. Used to
    /// avoid queuing an identical request twice.
    pub fn find_queued(&self, url: &str, method: Method) -> Option<String> {
        let state = self.inner.state.read();
        state
            .items
            .values()
            .find(|item| item.request.url == url && item.request.method == method)
            .map(|item| item.id.clone())
    }

    /// Existence check for an identical pending request.
    pub fn is_queued(&self, url: &str, method: Method) -> bool {
        self.find_queued(url, method).is_some()
    }

    pub fn get(&self, id: &str) -> Option<QueuedRequest> {
        self.inner.state.read().items.get(id).cloned()
    }

    /// Summary for UI badges.
    pub fn status(&self) -> QueueStatus {
        let requests = self.list();
        QueueStatus { count: requests.len(), requests }
    }

    /// Reactive status channel; fires on every enqueue/dequeue/attempt.
    pub fn watch_status(&self) -> watch::Receiver<QueueStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let count = {
            let mut state = self.inner.state.write();
            let count = state.items.len();
            state.items.clear();
            self.inner.metrics.update_size(0);
            count
        };

        self.publish_status();

        if count > 0 {
            info!(count, "queue cleared");
        }
        count
    }

    /// Re-insert persisted entries, preserving their original drain order.
    pub fn restore(&self, mut requests: Vec<QueuedRequest>) -> usize {
        requests.sort_by_key(|item| item.sequence);

        let count = {
            let mut state = self.inner.state.write();
            let count = requests.len();
            for mut request in requests {
                request.sequence = state.sequence;
                state.sequence += 1;
                state.items.insert(request.id.clone(), request);
            }
            self.inner.metrics.update_size(state.items.len());
            count
        };

        self.publish_status();

        if count > 0 {
            info!(count, "restored persisted queue entries");
        }
        count
    }

    /// Point-in-time metrics.
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub(crate) fn metrics_handle(&self) -> Arc<QueueMetrics> {
        self.inner.metrics.clone()
    }

    fn publish_status(&self) {
        self.inner.status_tx.send_replace(self.status());
    }
}

impl Clone for RequestQueueStore {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}
