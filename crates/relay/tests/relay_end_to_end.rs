//! Full offline-to-online journey through the assembled relay.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use rostra_relay::executor::ExecOptions;
use rostra_relay::network::{ConnectionType, NetworkState};
use rostra_relay::notify::Severity;
use rostra_relay::relay::Relay;
use rostra_relay::testing::{ManualProbe, MemorySink, MockTransport};
use rostra_relay::transport::RelayRequest;
use rostra_relay::RelayConfig;

/// A request issued offline is queued, survives in the store, and is
/// replayed automatically when connectivity returns.
#[tokio::test(flavor = "multi_thread")]
async fn offline_request_replays_on_reconnect() {
    let transport = MockTransport::new();
    let sink = MemorySink::new();
    let config = RelayConfig { base_backoff: Duration::ZERO, ..RelayConfig::default() };

    let relay = Relay::builder()
        .with_config(config)
        .with_probe(Arc::new(ManualProbe::new()))
        .with_transport(Arc::new(transport.clone()))
        .with_sink(Arc::new(sink.clone()))
        .build()
        .await
        .expect("build");

    relay.monitor().report(NetworkState::offline());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = relay
        .execute(
            RelayRequest::post("https://api.example.com/orders", json!({"qty": 3})),
            ExecOptions::new().description("Order"),
        )
        .await;

    assert!(result.is_queued());
    assert_eq!(relay.store().len(), 1);
    assert_eq!(transport.call_count(), 0);

    relay.monitor().report(NetworkState::online(ConnectionType::Wifi));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(relay.store().is_empty());
    assert_eq!(transport.calls_to("https://api.example.com/orders"), 1);

    // One "saved" toast when queued, one "synced" toast on replay.
    assert_eq!(sink.count_of(Severity::Info), 1);
    assert_eq!(sink.count_of(Severity::Success), 1);

    let metrics = relay.store().metrics();
    assert_eq!(metrics.total_enqueued, 1);
    assert_eq!(metrics.total_completed, 1);

    relay.shutdown().await;
}

/// Refreshing connectivity through the probe drives the same replay path
/// as a platform-reported transition.
#[tokio::test(flavor = "multi_thread")]
async fn probe_refresh_drives_reconnect() {
    let probe = Arc::new(ManualProbe::new());
    let transport = MockTransport::new();
    let config = RelayConfig { base_backoff: Duration::ZERO, ..RelayConfig::default() };

    let relay = Relay::builder()
        .with_config(config)
        .with_probe(probe.clone())
        .with_transport(Arc::new(transport.clone()))
        .with_sink(Arc::new(MemorySink::new()))
        .build()
        .await
        .expect("build");

    // A failed probe degrades the state to offline.
    probe.fail_next("no route to host");
    let state = relay.monitor().refresh().await;
    assert!(!state.is_online());
    tokio::time::sleep(Duration::from_millis(20)).await;

    relay
        .execute(RelayRequest::get("https://api.example.com/items"), ExecOptions::new())
        .await;
    assert_eq!(relay.store().len(), 1);

    // The next successful probe restores connectivity and drains.
    probe.set_state(NetworkState::online(ConnectionType::Cellular));
    let state = relay.monitor().refresh().await;
    assert!(state.is_online());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(relay.store().is_empty());
    assert_eq!(transport.call_count(), 1);

    relay.shutdown().await;
}
