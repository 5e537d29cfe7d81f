//! End-to-end executor behavior: online pass-through, offline deferral,
//! fail-fast calls, and user-facing notifications.

use std::sync::Arc;

use serde_json::json;

use rostra_relay::executor::{ExecOptions, NetworkAwareExecutor, Outcome};
use rostra_relay::network::{NetworkMonitor, NetworkState};
use rostra_relay::notify::Severity;
use rostra_relay::queue::{Priority, RequestQueueStore};
use rostra_relay::testing::{ManualProbe, MemorySink, MockTransport};
use rostra_relay::transport::{Method, RelayRequest, TransportError, TransportResponse};
use rostra_relay::RelayConfig;

struct Harness {
    monitor: NetworkMonitor,
    store: RequestQueueStore,
    transport: MockTransport,
    sink: MemorySink,
    executor: NetworkAwareExecutor,
}

fn harness() -> Harness {
    let monitor = NetworkMonitor::new(Arc::new(ManualProbe::new()));
    let store = RequestQueueStore::new(&RelayConfig::default());
    let transport = MockTransport::new();
    let sink = MemorySink::new();
    let executor = NetworkAwareExecutor::new(
        monitor.clone(),
        store.clone(),
        Arc::new(transport.clone()),
        Arc::new(sink.clone()),
    );
    Harness { monitor, store, transport, sink, executor }
}

/// An online call dispatches immediately and leaves the queue untouched.
#[tokio::test]
async fn online_call_executes_directly() {
    let h = harness();

    let result = h
        .executor
        .execute(RelayRequest::get("https://api.example.com/items"), ExecOptions::new())
        .await;

    assert_eq!(result.outcome(), Outcome::Executed);
    assert_eq!(h.transport.call_count(), 1);
    assert!(h.store.is_empty());
}

/// An offline call is deferred into the queue without touching the
/// transport, and the caller gets the queue id back.
#[tokio::test]
async fn offline_call_is_queued() {
    let h = harness();
    h.monitor.report(NetworkState::offline());

    let result = h
        .executor
        .execute(
            RelayRequest::post("https://api.example.com/orders", json!({"qty": 2})),
            ExecOptions::new().priority(Priority::High).description("Order"),
        )
        .await;

    let id = result.queued_id().expect("call should be queued").to_string();
    assert_eq!(h.transport.call_count(), 0);

    let entry = h.store.get(&id).expect("entry in queue");
    assert_eq!(entry.priority, Priority::High);
    assert_eq!(entry.description.as_deref(), Some("Order"));
    assert_eq!(entry.attempt, 0);
}

/// Queuing raises an informational "saved" notification.
#[tokio::test]
async fn offline_queueing_notifies_user() {
    let h = harness();
    h.monitor.report(NetworkState::offline());

    h.executor
        .execute(
            RelayRequest::post("https://api.example.com/orders", json!({})),
            ExecOptions::new().description("Order"),
        )
        .await;

    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].1, Severity::Info);
    assert!(notifications[0].0.contains("Order"));
    assert!(notifications[0].0.contains("back online"));
}

/// A call that opts out of queuing fails fast while offline.
#[tokio::test]
async fn offline_call_without_queueing_fails_fast() {
    let h = harness();
    h.monitor.report(NetworkState::offline());

    let result = h
        .executor
        .execute(
            RelayRequest::get("https://api.example.com/live"),
            ExecOptions::new().queue_on_offline(false),
        )
        .await;

    assert_eq!(result.outcome(), Outcome::Failed);
    assert_eq!(h.transport.call_count(), 0);
    assert!(h.store.is_empty());
    assert_eq!(h.sink.count_of(Severity::Error), 1);
}

/// Queuing the same url and method twice keeps a single entry and returns
/// the existing id.
#[tokio::test]
async fn duplicate_offline_calls_are_coalesced() {
    let h = harness();
    h.monitor.report(NetworkState::offline());

    let request = RelayRequest::post("https://api.example.com/orders", json!({"qty": 1}));
    let first = h.executor.execute(request.clone(), ExecOptions::new()).await;
    let second = h.executor.execute(request, ExecOptions::new()).await;

    assert_eq!(first.queued_id(), second.queued_id());
    assert_eq!(h.store.len(), 1);
    assert!(h.store.is_queued("https://api.example.com/orders", Method::Post));
}

/// A rejected online call surfaces a failure with a user-safe message;
/// raw transport details stay out of the notification text.
#[tokio::test]
async fn online_failure_reports_sanitized_message() {
    let h = harness();
    h.transport.set_default(Err(TransportError::Connection(
        "tcp connect error 10.0.0.7:443".to_string(),
    )));

    let result = h
        .executor
        .execute(RelayRequest::get("https://api.example.com/items"), ExecOptions::new())
        .await;

    assert_eq!(result.outcome(), Outcome::Failed);
    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].1, Severity::Error);
    assert!(!notifications[0].0.contains("10.0.0.7"));
}

/// Success notifications are opt-in.
#[tokio::test]
async fn success_notification_is_opt_in() {
    let h = harness();
    h.transport.set_default(Ok(TransportResponse::ok()));

    h.executor
        .execute(RelayRequest::get("https://api.example.com/a"), ExecOptions::new())
        .await;
    assert!(h.sink.notifications().is_empty());

    h.executor
        .execute(
            RelayRequest::get("https://api.example.com/b"),
            ExecOptions::new().notify_success(true).description("Report"),
        )
        .await;

    assert_eq!(h.sink.count_of(Severity::Success), 1);
}
