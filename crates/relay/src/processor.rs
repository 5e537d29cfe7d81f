//! Queue drain on reconnect.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::network::NetworkMonitor;
use crate::notify::{NotificationSink, Severity};
use crate::queue::{QueueMetrics, RequestQueueStore, RetryDisposition};
use crate::transport::Transport;

/// Result of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries whose replay was started.
    pub attempted: usize,
    /// Entries that replayed successfully and were removed.
    pub succeeded: usize,
    /// Entries that failed and stay queued for a later pass.
    pub requeued: usize,
    /// Entries that hit their attempt limit and were purged.
    pub exhausted: usize,
    /// True when the pass was skipped because a drain was already in
    /// flight.
    pub skipped: bool,
}

impl DrainReport {
    pub fn summary(&self) -> String {
        format!(
            "attempted={}, succeeded={}, requeued={}, exhausted={}",
            self.attempted, self.succeeded, self.requeued, self.exhausted
        )
    }
}

/// Replays queued requests when connectivity returns.
///
/// Each replay takes the same transport path a live request takes. At most
/// one drain pass runs at a time: a connectivity flap during a pass does
/// not start a second one, and the in-flight pass simply keeps failing
/// entries through the normal retry path if the network drops mid-pass.
pub struct QueueProcessor {
    inner: Arc<ProcessorInner>,
}

struct ProcessorInner {
    store: RequestQueueStore,
    monitor: NetworkMonitor,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn NotificationSink>,
    metrics: Arc<QueueMetrics>,
    notify_on_replay: bool,
    draining: AtomicBool,
}

impl QueueProcessor {
    pub fn new(
        store: RequestQueueStore,
        monitor: NetworkMonitor,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn NotificationSink>,
        config: &RelayConfig,
    ) -> Self {
        let metrics = store.metrics_handle();

        Self {
            inner: Arc::new(ProcessorInner {
                store,
                monitor,
                transport,
                sink,
                metrics,
                notify_on_replay: config.notify_on_replay,
                draining: AtomicBool::new(false),
            }),
        }
    }

    /// Spawn the background task that drains on every offline-to-online
    /// transition. Ends when the monitor is dropped.
    pub fn spawn(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();

        tokio::spawn(async move {
            let mut status_rx = inner.monitor.watch();
            let mut was_online = inner.monitor.state().is_online();

            // `changed()` coalesces rapid transitions to the latest value,
            // so a fast offline-online flap can be observed as still online
            // and skip a trigger. Queued entries are never lost by this;
            // they go out on the next transition or an explicit drain().
            while status_rx.changed().await.is_ok() {
                let online = status_rx.borrow_and_update().is_online();

                if online && !was_online {
                    info!("connectivity restored; draining request queue");
                    inner.drain().await;
                }

                was_online = online;
            }
        })
    }

    /// Run a drain pass now. Used for explicit user-triggered retries;
    /// returns a skipped report if a pass is already in flight.
    pub async fn drain(&self) -> DrainReport {
        self.inner.drain().await
    }
}

impl Clone for QueueProcessor {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl ProcessorInner {
    async fn drain(&self) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .is_err()
        {
            debug!("drain already in flight; not starting another");
            return DrainReport { skipped: true, ..DrainReport::default() };
        }
        let _guard = DrainGuard(&self.draining);

        let now = Utc::now();
        let snapshot = self.store.list();
        let mut report = DrainReport::default();

        if snapshot.is_empty() {
            return report;
        }
        debug!(pending = snapshot.len(), "drain pass started");

        for entry in snapshot {
            if !entry.is_due(now) {
                debug!(id = %entry.id, "backoff gate not yet passed; leaving queued");
                continue;
            }

            // The entry may have been removed since the snapshot was taken.
            if self.store.get(&entry.id).is_none() {
                continue;
            }

            report.attempted += 1;
            self.metrics.record_replay();

            match self.transport.send(&entry.request).await {
                Ok(_) => {
                    self.store.complete(&entry.id);
                    report.succeeded += 1;

                    if self.notify_on_replay {
                        let what = entry.description.as_deref().unwrap_or("Queued request");
                        self.sink.notify(&format!("{what} synced."), Severity::Success);
                    }
                }
                // A failure on one entry never aborts the rest of the pass.
                Err(e) => {
                    debug!(id = %entry.id, "replay failed: {e}");

                    match self.store.record_attempt(&entry.id, Some(e.to_string())) {
                        Ok(RetryDisposition::Rescheduled { .. }) => report.requeued += 1,
                        Ok(RetryDisposition::Exhausted(purged)) => {
                            report.exhausted += 1;

                            let exhausted = RelayError::RetriesExhausted {
                                id: purged.id.clone(),
                                attempts: purged.attempt,
                            };
                            error!(id = %purged.id, "{exhausted}");

                            let what =
                                purged.description.as_deref().unwrap_or("A queued request");
                            self.sink.notify(
                                &format!("{what} could not be synced and was discarded."),
                                Severity::Error,
                            );
                        }
                        Err(e) => warn!(id = %entry.id, "attempt bookkeeping failed: {e}"),
                    }
                }
            }
        }

        info!("drain pass finished: {}", report.summary());
        report
    }
}

/// Clears the single-flight flag even if a pass unwinds early.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, AtomicOrdering::Release);
    }
}
