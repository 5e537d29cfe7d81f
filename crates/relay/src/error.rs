//! Error taxonomy for the relay core.
//!
//! Failures surface to callers inside [`ExecutionResult`], not as thrown
//! errors: queuing while offline is a successful deferral, and genuine
//! failures are values the caller inspects. This keeps UI call sites
//! uniform: they branch on the outcome instead of catching exceptions.
//!
//! Module-specific errors compose with [`RelayError`] through transparent
//! variants so the `?` operator flows across module boundaries.
//!
//! [`ExecutionResult`]: crate::executor::ExecutionResult

use thiserror::Error;

use crate::queue::QueueError;
use crate::transport::TransportError;

/// Top-level relay error.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A call was attempted while offline and queuing was not requested.
    #[error("no network connection")]
    Offline,

    /// The underlying transport call was started and rejected.
    ///
    /// Carries the original cause so callers can map it to a user-facing
    /// message; the raw transport text is never shown directly.
    #[error("request failed: {0}")]
    Execution(#[from] TransportError),

    /// A queued request reached its attempt limit without succeeding.
    ///
    /// Reported exactly once, after which the entry is purged.
    #[error("request {id} exhausted after {attempts} attempts")]
    RetriesExhausted { id: String, attempts: u32 },

    /// Relay configuration failed validation.
    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Invariant violation inside the relay itself.
    #[error("internal relay error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Human-readable message suitable for a toast or banner.
    ///
    /// Transport and queue internals are deliberately flattened into
    /// generic wording; the cause remains available through `source()` for
    /// logging.
    pub fn user_message(&self) -> String {
        match self {
            Self::Offline => {
                "No internet connection. Check your network and try again.".to_string()
            }
            Self::Execution(_) => {
                "The request could not be completed. Please try again.".to_string()
            }
            Self::RetriesExhausted { attempts, .. } => {
                format!("This change could not be synced after {attempts} attempts and was discarded.")
            }
            Self::InvalidConfig(_) | Self::Queue(_) | Self::Internal(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
        }
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Offline => true,
            Self::Execution(e) => e.is_transient(),
            Self::RetriesExhausted { .. } | Self::InvalidConfig(_) | Self::Internal(_) => false,
            Self::Queue(_) => false,
        }
    }
}

/// Relay operation result type.
pub type RelayResult<T> = Result<T, RelayError>;
