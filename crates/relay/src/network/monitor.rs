//! Single source of truth for current connectivity.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::probe::ConnectivityProbe;
use super::state::{NetworkState, Reachability};

type Callback = Arc<dyn Fn(NetworkState) + Send + Sync>;

/// Observes device connectivity and notifies interested parties on change.
///
/// Explicitly constructed and passed to collaborators (no module-level
/// singleton); its lifecycle is tied to application start/stop, which
/// keeps tests free of hidden shared state.
///
/// Subscribers are notified in registration order, synchronously per
/// transition. Every reported transition notifies, even when the derived
/// online flag did not change; consumers decide whether to react.
pub struct NetworkMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    state: RwLock<NetworkState>,
    subscribers: RwLock<Vec<(u64, Callback)>>,
    next_subscriber_id: AtomicU64,
    status_tx: watch::Sender<NetworkState>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl NetworkMonitor {
    /// Create a monitor in the neutral starting state.
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        let initial = NetworkState::neutral();
        let (status_tx, _status_rx) = watch::channel(initial);

        Self {
            inner: Arc::new(MonitorInner {
                state: RwLock::new(initial),
                subscribers: RwLock::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(0),
                status_tx,
                probe,
            }),
        }
    }

    /// Last-known snapshot. Synchronous, never blocks on I/O.
    pub fn state(&self) -> NetworkState {
        *self.inner.state.read()
    }

    /// Register a callback invoked on every state transition.
    ///
    /// Dropping the returned [`Subscription`] (or calling
    /// [`Subscription::unsubscribe`]) stops further notifications for that
    /// callback without disturbing other subscribers.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NetworkState) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner.subscribers.write().push((id, Arc::new(callback)));

        Subscription { id, monitor: Arc::downgrade(&self.inner) }
    }

    /// Watch channel for async consumers (queue processor, UI badges).
    pub fn watch(&self) -> watch::Receiver<NetworkState> {
        self.inner.status_tx.subscribe()
    }

    /// Entry point for platform connectivity callbacks.
    #[instrument(skip(self), fields(online = state.is_online(), link = %state.connection_type))]
    pub fn report(&self, state: NetworkState) {
        {
            let mut current = self.inner.state.write();
            *current = state;
        }

        self.inner.status_tx.send_replace(state);

        // Snapshot under the read lock, invoke outside it so a subscriber
        // that re-enters the monitor cannot deadlock.
        let subscribers: Vec<Callback> =
            self.inner.subscribers.read().iter().map(|(_, cb)| cb.clone()).collect();

        debug!(subscribers = subscribers.len(), "connectivity transition");

        for callback in subscribers {
            callback(state);
        }
    }

    /// Force an active connectivity probe and update internal state before
    /// returning it. Used for explicit user-triggered retry actions.
    ///
    /// A failed probe does not error: it resolves to the best-known state
    /// with reachability marked [`Reachability::No`].
    pub async fn refresh(&self) -> NetworkState {
        match self.inner.probe.probe().await {
            Ok(state) => {
                self.report(state);
                state
            }
            Err(e) => {
                warn!("connectivity probe failed: {e}");
                let mut state = self.state();
                state.reachability = Reachability::No;
                self.report(state);
                state
            }
        }
    }
}

impl Clone for NetworkMonitor {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

/// Handle to a registered connectivity callback.
///
/// The callback is removed when this is dropped.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    monitor: Weak<MonitorInner>,
}

impl Subscription {
    /// Explicitly remove the callback. Equivalent to dropping.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner.subscribers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
