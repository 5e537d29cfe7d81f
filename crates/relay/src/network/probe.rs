//! Active connectivity probing.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::state::{ConnectionType, NetworkState, Reachability};
use crate::config::RelayConfig;

/// Probe failure. Never propagated out of
/// [`NetworkMonitor::refresh`](super::NetworkMonitor::refresh); a failed
/// probe resolves to a degraded state instead.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("connectivity probe failed: {0}")]
    Failed(String),
}

/// Source of actively probed connectivity state.
///
/// Platform adapters implement this on top of the OS connectivity API;
/// [`HttpProbe`] is the plain HTTP fallback used when no richer platform
/// signal is available.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self) -> Result<NetworkState, ProbeError>;
}

/// HTTP reachability probe against a lightweight no-content endpoint.
///
/// Confirms a live internet path but cannot observe the link type, so the
/// connection type of a successful probe is `Unknown`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    /// Build a probe from relay configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ProbeError> {
        Self::new(config.probe_url.clone(), config.probe_timeout)
    }

    /// Build a probe for the given URL and timeout.
    pub fn new(url: String, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Failed(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn probe(&self) -> Result<NetworkState, ProbeError> {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "connectivity probe succeeded");
                Ok(NetworkState {
                    is_connected: true,
                    reachability: Reachability::Yes,
                    connection_type: ConnectionType::Unknown,
                    is_slow: false,
                })
            }
            Err(e) => Err(ProbeError::Failed(e.to_string())),
        }
    }
}
