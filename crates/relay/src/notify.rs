//! UI notification boundary.
//!
//! The relay core is agnostic to how messages are displayed; the consuming
//! shell (toast, snackbar, log pane) implements [`NotificationSink`] and
//! receives `(message, severity)` pairs. Messages are always mapped,
//! human-readable text; raw transport errors never cross this boundary.

use std::fmt;

use tracing::{error, info, warn};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Receiver for user-facing notifications emitted by the relay.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification. Implementations must not block; the relay
    /// does not await completion.
    fn notify(&self, message: &str, severity: Severity);
}

/// Default sink that forwards notifications to the `tracing` log stream.
///
/// Used when the embedding application has not wired a UI sink yet, so
/// nothing is silently dropped.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(%severity, "{message}"),
            Severity::Warning => warn!(%severity, "{message}"),
            Severity::Error => error!(%severity, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Success.to_string(), "success");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
