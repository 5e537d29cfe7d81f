//! Network-aware call execution.
//!
//! The single decision point used by all call sites: it hides the
//! online/offline branching so UI code issues a request and branches on
//! the returned [`ExecutionResult`] outcome instead of catching errors.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::error::RelayError;
use crate::network::NetworkMonitor;
use crate::notify::{NotificationSink, Severity};
use crate::pipeline::{CallContext, CallStage, DispatchStage, Next, NetworkCheckStage};
use crate::queue::{Priority, RequestQueueStore};
use crate::transport::{RelayRequest, Transport, TransportResponse};

/// The tri-state outcome of an executor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Executed,
    Queued,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Executed => write!(f, "executed"),
            Outcome::Queued => write!(f, "queued"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a call routed through the executor.
///
/// Queuing is a successful deferral, not a failure; it travels on a
/// distinct arm so UI can show "will retry" messaging instead of an
/// error.
#[derive(Debug)]
pub enum ExecutionResult<T> {
    /// The call ran and succeeded.
    Executed(T),
    /// The call was deferred into the request queue.
    Queued { id: String },
    /// The call ran and was rejected, or was attempted offline without
    /// queuing enabled.
    Failed(RelayError),
}

impl<T> ExecutionResult<T> {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Executed(_) => Outcome::Executed,
            Self::Queued { .. } => Outcome::Queued,
            Self::Failed(_) => Outcome::Failed,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Response payload, present iff the call executed and succeeded.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Executed(value) => Some(value),
            _ => None,
        }
    }

    /// Queue id, present iff the call was deferred.
    pub fn queued_id(&self) -> Option<&str> {
        match self {
            Self::Queued { id } => Some(id),
            _ => None,
        }
    }

    /// Error description, present iff the call failed.
    pub fn error(&self) -> Option<&RelayError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Per-call execution configuration.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Defer into the queue instead of failing when offline.
    pub queue_on_offline: bool,
    /// Drain-order band used if the call is queued.
    pub priority: Priority,
    /// Short label for notifications and queue display.
    pub description: Option<String>,
    /// Raise a success notification when the call executes.
    pub notify_success: bool,
    /// Raise an error notification when the call fails.
    pub notify_error: bool,
    /// Per-call attempt limit override for queued replays.
    pub max_attempts: Option<u32>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            queue_on_offline: true,
            priority: Priority::Medium,
            description: None,
            notify_success: false,
            notify_error: true,
            max_attempts: None,
        }
    }
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_on_offline(mut self, queue: bool) -> Self {
        self.queue_on_offline = queue;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn notify_success(mut self, notify: bool) -> Self {
        self.notify_success = notify;
        self
    }

    pub fn notify_error(mut self, notify: bool) -> Self {
        self.notify_error = notify;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Routes calls through the stage pipeline based on current connectivity.
///
/// A call that is mid-flight when connectivity drops runs to completion or
/// to its transport timeout; the executor does not cancel in-flight
/// requests on disconnect. Direct calls that start and fail are not
/// auto-queued; retry of queued entries belongs to the processor.
pub struct NetworkAwareExecutor {
    monitor: NetworkMonitor,
    sink: Arc<dyn NotificationSink>,
    stages: Vec<Arc<dyn CallStage>>,
}

impl NetworkAwareExecutor {
    pub fn new(
        monitor: NetworkMonitor,
        store: RequestQueueStore,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let stages: Vec<Arc<dyn CallStage>> =
            vec![Arc::new(NetworkCheckStage::new(store)), Arc::new(DispatchStage::new(transport))];

        Self { monitor, sink, stages }
    }

    /// Execute a call, deferring or failing it according to connectivity
    /// and the per-call options.
    #[instrument(skip(self, request, options), fields(url = %request.url, method = %request.method))]
    pub async fn execute(
        &self,
        request: RelayRequest,
        options: ExecOptions,
    ) -> ExecutionResult<TransportResponse> {
        let ctx =
            CallContext { request, options: options.clone(), network: self.monitor.state() };

        let result = Next::new(&self.stages).run(ctx).await;
        self.report(&result, &options);
        result
    }

    fn report(&self, result: &ExecutionResult<TransportResponse>, options: &ExecOptions) {
        let what = options.description.as_deref();
        match result {
            ExecutionResult::Queued { .. } => {
                let message = format!(
                    "{} saved. It will be sent when you are back online.",
                    what.unwrap_or("Your request")
                );
                self.sink.notify(&message, Severity::Info);
            }
            ExecutionResult::Executed(_) if options.notify_success => {
                let message = format!("{} completed.", what.unwrap_or("Your request"));
                self.sink.notify(&message, Severity::Success);
            }
            ExecutionResult::Failed(e) if options.notify_error => {
                self.sink.notify(&e.user_message(), Severity::Error);
            }
            _ => {}
        }
    }
}

impl Clone for NetworkAwareExecutor {
    fn clone(&self) -> Self {
        Self { monitor: self.monitor.clone(), sink: self.sink.clone(), stages: self.stages.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Executed.to_string(), "executed");
        assert_eq!(Outcome::Queued.to_string(), "queued");
        assert_eq!(Outcome::Failed.to_string(), "failed");
    }

    #[test]
    fn test_execution_result_accessors() {
        let executed: ExecutionResult<u32> = ExecutionResult::Executed(7);
        assert_eq!(executed.outcome(), Outcome::Executed);
        assert_eq!(executed.value(), Some(7));

        let queued: ExecutionResult<u32> = ExecutionResult::Queued { id: "q-1".to_string() };
        assert!(queued.is_queued());
        assert_eq!(queued.queued_id(), Some("q-1"));
        assert_eq!(queued.value(), None);

        let failed: ExecutionResult<u32> = ExecutionResult::Failed(RelayError::Offline);
        assert!(failed.is_failed());
        assert!(matches!(failed.error(), Some(RelayError::Offline)));
    }

    #[test]
    fn test_options_defaults() {
        let options = ExecOptions::default();
        assert!(options.queue_on_offline);
        assert_eq!(options.priority, Priority::Medium);
        assert!(!options.notify_success);
        assert!(options.notify_error);
        assert!(options.max_attempts.is_none());
    }
}
