//! Relay configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the relay core.
///
/// Constructed once at application start and passed to [`Relay::builder`];
/// no component reads configuration from ambient globals.
///
/// [`Relay::builder`]: crate::relay::Relay::builder
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Attempt limit applied to queued requests that do not set their own.
    pub default_max_attempts: u32,
    /// Base delay for the exponential retry backoff curve.
    pub base_backoff: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
    /// URL probed by [`refresh`] to confirm a live internet path.
    ///
    /// [`refresh`]: crate::network::NetworkMonitor::refresh
    pub probe_url: String,
    /// Timeout applied to a single connectivity probe.
    pub probe_timeout: Duration,
    /// Timeout owned by the default HTTP transport. The queue and executor
    /// layers impose no additional timeout of their own.
    pub request_timeout: Duration,
    /// Whether successful replays of queued requests raise a notification.
    pub notify_on_replay: bool,
    /// Snapshot file for durable queue persistence. `None` keeps the queue
    /// in memory only.
    pub persistence_path: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(300),
            probe_url: "https://clients3.google.com/generate_204".to_string(),
            probe_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            notify_on_replay: true,
            persistence_path: None,
        }
    }
}

impl RelayConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_max_attempts == 0 {
            return Err("Max attempts must be greater than 0".to_string());
        }

        if self.base_backoff > self.max_backoff {
            return Err("Base backoff cannot exceed max backoff".to_string());
        }

        if self.probe_url.is_empty() {
            return Err("Probe URL must not be empty".to_string());
        }

        if self.probe_timeout.is_zero() {
            return Err("Probe timeout must be greater than 0".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_max_attempts, 3);
    }

    #[test]
    fn test_validate_zero_attempts() {
        let config = RelayConfig { default_max_attempts: 0, ..RelayConfig::default() };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Max attempts"));
    }

    #[test]
    fn test_validate_backoff_ordering() {
        let config = RelayConfig {
            base_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(1),
            ..RelayConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("backoff"));
    }

    #[test]
    fn test_validate_empty_probe_url() {
        let config = RelayConfig { probe_url: String::new(), ..RelayConfig::default() };

        assert!(config.validate().is_err());
    }
}
