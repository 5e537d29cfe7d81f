use thiserror::Error;

/// Queue operation errors.
///
/// Store mutations themselves are infallible (bounded only by memory);
/// these errors come from attempt bookkeeping on absent entries and from
/// the persistence layer.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queued request not found: {0}")]
    NotFound(String),

    #[error("queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("queue I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue storage error: {0}")]
    Storage(String),
}

/// Queue operation result type.
pub type QueueResult<T> = Result<T, QueueError>;
