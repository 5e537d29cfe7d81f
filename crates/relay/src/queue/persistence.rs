//! Durable queue snapshots.
//!
//! The store itself is in-memory; durability beyond process lifetime comes
//! from a [`QueueStorage`] backend fed by the store's status channel, so
//! saves happen on change rather than on a timer.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::errors::QueueResult;
use super::store::RequestQueueStore;
use super::types::QueuedRequest;

/// Snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub count: usize,
}

/// Persisted queue snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedQueue {
    pub metadata: SnapshotMetadata,
    pub requests: Vec<QueuedRequest>,
}

/// Key-value style persistence backend for the queue.
#[async_trait]
pub trait QueueStorage: Send + Sync {
    /// Load the persisted entries. An absent snapshot is an empty queue,
    /// not an error.
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>>;

    /// Replace the persisted snapshot with the given entries.
    async fn save(&self, requests: &[QueuedRequest]) -> QueueResult<()>;

    /// Drop the persisted snapshot.
    async fn clear(&self) -> QueueResult<()>;
}

/// File-backed storage writing versioned JSON snapshots.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileQueueStorage {
    path: PathBuf,
}

impl FileQueueStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl QueueStorage for FileQueueStorage {
    #[instrument(skip(self))]
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no queue snapshot on disk");
            return Ok(Vec::new());
        }

        let data = fs::read(&self.path).await?;
        let snapshot: PersistedQueue = serde_json::from_slice(&data)?;

        if snapshot.metadata.version != SNAPSHOT_VERSION {
            warn!(
                expected = SNAPSHOT_VERSION,
                found = snapshot.metadata.version,
                "queue snapshot version mismatch"
            );
        }

        info!(count = snapshot.requests.len(), "loaded queue snapshot");
        Ok(snapshot.requests)
    }

    #[instrument(skip(self, requests), fields(count = requests.len()))]
    async fn save(&self, requests: &[QueuedRequest]) -> QueueResult<()> {
        let snapshot = PersistedQueue {
            metadata: SnapshotMetadata {
                version: SNAPSHOT_VERSION,
                saved_at: Utc::now(),
                count: requests.len(),
            },
            requests: requests.to_vec(),
        };

        let data = serde_json::to_vec(&snapshot)?;

        let temp_path = self.path.with_extension("tmp");
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        debug!(bytes = data.len(), "queue snapshot persisted");
        Ok(())
    }

    async fn clear(&self) -> QueueResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
            debug!(path = %self.path.display(), "queue snapshot deleted");
        }
        Ok(())
    }
}

/// Load persisted entries into the store at startup.
///
/// Load failures are logged and leave the store empty rather than aborting
/// application start.
pub async fn restore_from(store: &RequestQueueStore, storage: &dyn QueueStorage) -> usize {
    match storage.load().await {
        Ok(requests) => store.restore(requests),
        Err(e) => {
            warn!("failed to load persisted queue: {e}");
            0
        }
    }
}

/// Spawn the background task that persists the queue on every change.
///
/// Ends when the store is dropped (the status channel closes).
pub fn spawn_persistence(
    store: RequestQueueStore,
    storage: std::sync::Arc<dyn QueueStorage>,
) -> JoinHandle<()> {
    let mut status_rx = store.watch_status();
    let metrics = store.metrics_handle();

    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let snapshot = status_rx.borrow_and_update().requests.clone();

            match storage.save(&snapshot).await {
                Ok(()) => metrics.record_persistence(true),
                Err(e) => {
                    error!("failed to persist queue: {e}");
                    metrics.record_persistence(false);
                }
            }
        }
    })
}
