//! Mock implementations of the relay's collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::network::{ConnectivityProbe, NetworkState, ProbeError};
use crate::notify::{NotificationSink, Severity};
use crate::queue::{QueueError, QueueResult, QueueStorage, QueuedRequest};
use crate::transport::{RelayRequest, Transport, TransportError, TransportResponse};

/// Controllable connectivity probe.
#[derive(Debug)]
pub struct ManualProbe {
    state: Mutex<NetworkState>,
    fail_next: Mutex<Option<String>>,
}

impl ManualProbe {
    pub fn new() -> Self {
        Self { state: Mutex::new(NetworkState::neutral()), fail_next: Mutex::new(None) }
    }

    /// Set the state the next probe resolves with.
    pub fn set_state(&self, state: NetworkState) {
        *self.state.lock() = state;
    }

    /// Make the next probe fail with the given message.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock() = Some(message.into());
    }
}

impl Default for ManualProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for ManualProbe {
    async fn probe(&self) -> Result<NetworkState, ProbeError> {
        if let Some(message) = self.fail_next.lock().take() {
            return Err(ProbeError::Failed(message));
        }
        Ok(*self.state.lock())
    }
}

type ScriptedResponses = Mutex<HashMap<String, VecDeque<Result<TransportResponse, TransportError>>>>;

/// Scriptable transport recording every dispatched request.
///
/// Responses are scripted per URL and consumed in order; URLs without a
/// script fall back to the default result (success with an empty body
/// unless overridden).
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockTransportInner>,
}

struct MockTransportInner {
    scripted: ScriptedResponses,
    default_result: Mutex<Result<TransportResponse, TransportError>>,
    requests: Mutex<Vec<RelayRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockTransportInner {
                scripted: Mutex::new(HashMap::new()),
                default_result: Mutex::new(Ok(TransportResponse::ok())),
                requests: Mutex::new(Vec::new()),
                delay: Mutex::new(None),
            }),
        }
    }

    /// Transport whose every call fails with the given error.
    pub fn failing(error: TransportError) -> Self {
        let transport = Self::new();
        transport.set_default(Err(error));
        transport
    }

    /// Replace the fallback result for unscripted URLs.
    pub fn set_default(&self, result: Result<TransportResponse, TransportError>) {
        *self.inner.default_result.lock() = result;
    }

    /// Script an ordered response sequence for a URL.
    pub fn script(&self, url: &str, results: Vec<Result<TransportResponse, TransportError>>) {
        self.inner.scripted.lock().insert(url.to_string(), results.into());
    }

    /// Delay every call, for exercising overlap behavior.
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock() = Some(delay);
    }

    /// All requests dispatched so far, in order.
    pub fn requests(&self) -> Vec<RelayRequest> {
        self.inner.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.requests.lock().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.inner.requests.lock().iter().filter(|r| r.url == url).count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &RelayRequest) -> Result<TransportResponse, TransportError> {
        self.inner.requests.lock().push(request.clone());

        let delay = *self.inner.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .inner
            .scripted
            .lock()
            .get_mut(&request.url)
            .and_then(|responses| responses.pop_front());

        match scripted {
            Some(result) => result,
            None => self.inner.default_result.lock().clone(),
        }
    }
}

/// Sink capturing notifications for assertions.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(String, Severity)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.entries.lock().clone()
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.entries.lock().iter().filter(|(_, s)| *s == severity).count()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries.lock().push((message.to_string(), severity));
    }
}

/// In-memory queue storage.
#[derive(Clone, Default)]
pub struct MemoryQueueStorage {
    inner: Arc<MemoryStorageInner>,
}

#[derive(Default)]
struct MemoryStorageInner {
    saved: Mutex<Vec<QueuedRequest>>,
    fail_saves: AtomicBool,
}

impl MemoryQueueStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last snapshot passed to `save`.
    pub fn saved(&self) -> Vec<QueuedRequest> {
        self.inner.saved.lock().clone()
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl QueueStorage for MemoryQueueStorage {
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>> {
        Ok(self.inner.saved.lock().clone())
    }

    async fn save(&self, requests: &[QueuedRequest]) -> QueueResult<()> {
        if self.inner.fail_saves.load(AtomicOrdering::SeqCst) {
            return Err(QueueError::Storage("simulated save failure".to_string()));
        }
        *self.inner.saved.lock() = requests.to_vec();
        Ok(())
    }

    async fn clear(&self) -> QueueResult<()> {
        self.inner.saved.lock().clear();
        Ok(())
    }
}
