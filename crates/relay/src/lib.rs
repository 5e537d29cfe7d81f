//! Rostra relay: offline-aware request execution for intermittently
//! connected clients.
//!
//! The relay sits between application code and the network. Calls made
//! while online go straight to the transport; calls made while offline are
//! captured as durable queue entries and replayed automatically when
//! connectivity returns, with priority ordering, exponential backoff, and
//! a bounded number of attempts per entry.
//!
//! # Components
//!
//! - [`network::NetworkMonitor`] holds the current connectivity snapshot
//!   and notifies subscribers on every transition.
//! - [`queue::RequestQueueStore`] owns the deferred requests and their
//!   retry bookkeeping, publishing status changes over a watch channel.
//! - [`executor::NetworkAwareExecutor`] is the single decision point that
//!   routes a call to the transport or into the queue.
//! - [`processor::QueueProcessor`] drains the queue on reconnect, one pass
//!   at a time.
//! - [`relay::Relay`] wires the pieces together and runs the background
//!   tasks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rostra_relay::executor::ExecOptions;
//! use rostra_relay::relay::Relay;
//! use rostra_relay::transport::RelayRequest;
//!
//! # async fn run() -> Result<(), rostra_relay::error::RelayError> {
//! let relay = Relay::builder().build().await?;
//!
//! let result = relay
//!     .execute(
//!         RelayRequest::post("https://api.example.com/orders", serde_json::json!({"qty": 2})),
//!         ExecOptions::new().description("Order"),
//!     )
//!     .await;
//!
//! if result.is_queued() {
//!     println!("offline; order will sync later");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod error;
pub mod executor;
pub mod network;
pub mod notify;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod relay;
pub mod testing;
pub mod transport;

pub use self::config::RelayConfig;
pub use self::error::{RelayError, RelayResult};
pub use self::executor::{ExecOptions, ExecutionResult, NetworkAwareExecutor, Outcome};
pub use self::network::{NetworkMonitor, NetworkState};
pub use self::processor::{DrainReport, QueueProcessor};
pub use self::queue::{Priority, QueuedRequest, RequestQueueStore};
pub use self::relay::{Relay, RelayBuilder};
pub use self::transport::{Method, RelayRequest, TransportResponse};
