//! Composable call pipeline.
//!
//! Cross-cutting concerns (network check, dispatch) are middleware stages
//! over a call descriptor rather than wrappers around UI components: each
//! stage either resolves the call itself or passes it to the remainder of
//! the chain via [`Next`]. The executor owns the stage order; notification
//! emission happens at its boundary, outside the chain.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::RelayError;
use crate::executor::{ExecOptions, ExecutionResult};
use crate::network::NetworkState;
use crate::queue::{QueuedRequestInput, RequestQueueStore};
use crate::transport::{RelayRequest, Transport, TransportResponse};

/// One in-flight call travelling through the pipeline.
pub struct CallContext {
    pub request: RelayRequest,
    pub options: ExecOptions,
    /// Connectivity snapshot taken when the call entered the executor.
    pub network: NetworkState,
}

/// A middleware stage: `(call, next) -> result`.
pub trait CallStage: Send + Sync {
    fn handle<'a>(
        &'a self,
        ctx: CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ExecutionResult<TransportResponse>>;
}

/// Remainder of the stage chain after the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn CallStage>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn CallStage>]) -> Self {
        Self { stages }
    }

    /// Run the rest of the chain.
    pub async fn run(self, ctx: CallContext) -> ExecutionResult<TransportResponse> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(ctx, Next { stages: rest }).await,
            None => ExecutionResult::Failed(RelayError::Internal(
                "call pipeline ended without a dispatch stage".to_string(),
            )),
        }
    }
}

/// Decides between immediate execution, deferral, and fail-fast based on
/// the connectivity snapshot. Online calls pass straight through,
/// regardless of their queue preference.
pub struct NetworkCheckStage {
    store: RequestQueueStore,
}

impl NetworkCheckStage {
    pub fn new(store: RequestQueueStore) -> Self {
        Self { store }
    }
}

impl CallStage for NetworkCheckStage {
    fn handle<'a>(
        &'a self,
        ctx: CallContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ExecutionResult<TransportResponse>> {
        Box::pin(async move {
            if ctx.network.is_online() {
                return next.run(ctx).await;
            }

            if !ctx.options.queue_on_offline {
                return ExecutionResult::Failed(RelayError::Offline);
            }

            // The call is never started while offline; it cannot succeed.
            if let Some(id) = self.store.find_queued(&ctx.request.url, ctx.request.method) {
                debug!(id, "identical request already queued; not queuing again");
                return ExecutionResult::Queued { id };
            }

            let mut input =
                QueuedRequestInput::new(ctx.request).with_priority(ctx.options.priority);
            if let Some(description) = ctx.options.description {
                input = input.with_description(description);
            }
            if let Some(max_attempts) = ctx.options.max_attempts {
                input = input.with_max_attempts(max_attempts);
            }

            let id = self.store.enqueue(input);
            ExecutionResult::Queued { id }
        })
    }
}

/// Terminal stage: hands the descriptor to the transport.
pub struct DispatchStage {
    transport: Arc<dyn Transport>,
}

impl DispatchStage {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl CallStage for DispatchStage {
    fn handle<'a>(
        &'a self,
        ctx: CallContext,
        _next: Next<'a>,
    ) -> BoxFuture<'a, ExecutionResult<TransportResponse>> {
        Box::pin(async move {
            match self.transport.send(&ctx.request).await {
                Ok(response) => ExecutionResult::Executed(response),
                Err(e) => ExecutionResult::Failed(RelayError::Execution(e)),
            }
        })
    }
}
