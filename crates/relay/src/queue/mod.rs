// Deferred request queue: ordered store, retry bookkeeping, persistence.

mod errors;
pub mod metrics;
mod persistence;
mod store;
mod types;

pub use self::errors::{QueueError, QueueResult};
pub use self::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use self::persistence::{
    restore_from, spawn_persistence, FileQueueStorage, PersistedQueue, QueueStorage,
    SnapshotMetadata,
};
pub use self::store::{QueueStatus, RequestQueueStore, RetryDisposition};
pub use self::types::{Priority, QueuedRequest, QueuedRequestInput};
