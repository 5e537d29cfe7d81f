//! Top-level assembly of the relay components.
//!
//! Applications construct one [`Relay`] at startup and share clones of the
//! pieces they need. The builder wires the network monitor, queue store,
//! executor, and processor together, restores any persisted queue, and
//! spawns the background drain and persistence tasks.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::executor::{ExecOptions, ExecutionResult, NetworkAwareExecutor};
use crate::network::{ConnectivityProbe, HttpProbe, NetworkMonitor};
use crate::notify::{NotificationSink, TracingSink};
use crate::processor::{DrainReport, QueueProcessor};
use crate::queue::{
    restore_from, spawn_persistence, FileQueueStorage, QueueStorage, RequestQueueStore,
};
use crate::transport::{HttpTransport, RelayRequest, Transport, TransportResponse};

/// Builder for a [`Relay`].
///
/// Every collaborator has a production default; tests and platform
/// embeddings swap in their own probe, transport, sink, or storage.
pub struct RelayBuilder {
    config: RelayConfig,
    transport: Option<Arc<dyn Transport>>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    sink: Option<Arc<dyn NotificationSink>>,
    storage: Option<Arc<dyn QueueStorage>>,
}

impl RelayBuilder {
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            transport: None,
            probe: None,
            sink: None,
            storage: None,
        }
    }

    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn QueueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Assemble the relay, restore any persisted queue, and spawn the
    /// background tasks.
    pub async fn build(self) -> RelayResult<Relay> {
        self.config.validate().map_err(RelayError::InvalidConfig)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.request_timeout)?),
        };
        let probe: Arc<dyn ConnectivityProbe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(
                HttpProbe::from_config(&self.config)
                    .map_err(|e| RelayError::InvalidConfig(e.to_string()))?,
            ),
        };
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let storage = self.storage.or_else(|| {
            self.config
                .persistence_path
                .clone()
                .map(|path| Arc::new(FileQueueStorage::new(path)) as Arc<dyn QueueStorage>)
        });

        let monitor = NetworkMonitor::new(probe);
        let store = RequestQueueStore::new(&self.config);

        let executor =
            NetworkAwareExecutor::new(monitor.clone(), store.clone(), transport.clone(), sink.clone());
        let processor =
            QueueProcessor::new(store.clone(), monitor.clone(), transport, sink, &self.config);

        let mut tasks = Vec::new();
        let mut restored = 0;
        if let Some(storage) = &storage {
            restored = restore_from(&store, storage.as_ref()).await;
            if restored > 0 {
                info!(restored, "queue restored from persistent storage");
            }
            tasks.push(spawn_persistence(store.clone(), storage.clone()));
        }
        tasks.push(processor.spawn());

        // The drain task only fires on an offline-to-online transition.
        // Entries restored from a previous offline session must not wait
        // for the network to flap, so replay them now if we are online.
        if restored > 0 && monitor.state().is_online() {
            let startup_processor = processor.clone();
            tasks.push(tokio::spawn(async move {
                startup_processor.drain().await;
            }));
        }

        Ok(Relay {
            config: self.config,
            monitor,
            store,
            executor,
            processor,
            storage,
            tasks: Mutex::new(tasks),
        })
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembled offline-aware request relay.
pub struct Relay {
    config: RelayConfig,
    monitor: NetworkMonitor,
    store: RequestQueueStore,
    executor: NetworkAwareExecutor,
    processor: QueueProcessor,
    storage: Option<Arc<dyn QueueStorage>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Relay {
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    pub fn store(&self) -> &RequestQueueStore {
        &self.store
    }

    pub fn executor(&self) -> &NetworkAwareExecutor {
        &self.executor
    }

    pub fn processor(&self) -> &QueueProcessor {
        &self.processor
    }

    /// Execute a request through the network-aware pipeline.
    pub async fn execute(
        &self,
        request: RelayRequest,
        options: ExecOptions,
    ) -> ExecutionResult<TransportResponse> {
        self.executor.execute(request, options).await
    }

    /// Drain the queue now instead of waiting for a reconnect event.
    pub async fn drain(&self) -> DrainReport {
        self.processor.drain().await
    }

    /// Stop the background tasks and flush a final queue snapshot.
    pub async fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }

        if let Some(storage) = &self.storage {
            let snapshot = self.store.list();
            if let Err(e) = storage.save(&snapshot).await {
                warn!("final queue snapshot failed: {e}");
            }
        }

        info!("relay shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualProbe, MemorySink, MockTransport};

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let config = RelayConfig { default_max_attempts: 0, ..RelayConfig::default() };

        let result = Relay::builder()
            .with_config(config)
            .with_probe(Arc::new(ManualProbe::new()))
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .await;

        assert!(matches!(result, Err(RelayError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_build_wires_components() {
        let relay = Relay::builder()
            .with_probe(Arc::new(ManualProbe::new()))
            .with_transport(Arc::new(MockTransport::new()))
            .with_sink(Arc::new(MemorySink::new()))
            .build()
            .await
            .unwrap();

        assert!(relay.store().is_empty());
        assert!(relay.monitor().state().is_online());
        relay.shutdown().await;
    }
}
