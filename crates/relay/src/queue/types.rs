use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::transport::RelayRequest;

/// Drain-order band of a queued request.
///
/// Bands drain High, Medium, Low; within a band earlier-enqueued requests
/// drain first, so a request is never starved by later insertions outside
/// its own band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A deferred API call awaiting replay.
///
/// Created when the executor defers a call while offline, mutated only by
/// attempt bookkeeping during drains, destroyed on success or on reaching
/// its attempt limit. `attempt <= max_attempts` holds at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Unique id assigned at enqueue time.
    pub id: String,
    /// The call descriptor replayed through the transport.
    pub request: RelayRequest,
    pub priority: Priority,
    /// Completed execution attempts.
    pub attempt: u32,
    pub max_attempts: u32,
    /// Short label for UI and log display ("Mark attendance", ...).
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Earliest time the next replay may run (backoff gate). `None` means
    /// immediately eligible.
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// Message from the most recent failed attempt.
    pub last_error: Option<String>,
    /// Enqueue sequence number, FIFO tiebreaker within a priority band.
    pub(crate) sequence: u64,
}

impl QueuedRequest {
    /// Whether another replay attempt is allowed.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Whether the backoff gate has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.map_or(true, |at| at <= now)
    }

    /// Backoff delay before the next attempt: `base * 2^attempt` capped at
    /// `max`, plus 0-25% jitter to spread reconnection bursts.
    pub fn backoff_delay(&self, base: Duration, max: Duration) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);

        // Cap the exponent to avoid overflow on pathological attempt counts.
        let exp = self.attempt.min(10);
        let backoff = base_ms.saturating_mul(2_u64.saturating_pow(exp)).min(max_ms);

        let jitter_bound = backoff / 4;
        let jitter =
            if jitter_bound > 0 { rand::thread_rng().gen_range(0..=jitter_bound) } else { 0 };

        Duration::from_millis(backoff.saturating_add(jitter))
    }
}

/// Input for enqueuing a request; the store assigns id, timestamps, and
/// sequence.
#[derive(Debug, Clone)]
pub struct QueuedRequestInput {
    pub request: RelayRequest,
    pub priority: Priority,
    pub description: Option<String>,
    /// Overrides the configured default when set.
    pub max_attempts: Option<u32>,
}

impl QueuedRequestInput {
    pub fn new(request: RelayRequest) -> Self {
        Self { request, priority: Priority::Medium, description: None, max_attempts: None }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample(attempt: u32, max_attempts: u32) -> QueuedRequest {
        QueuedRequest {
            id: "q-1".to_string(),
            request: RelayRequest::post("https://api.example.com/leads", json!({"n": 1})),
            priority: Priority::Medium,
            attempt,
            max_attempts,
            description: None,
            created_at: Utc::now(),
            next_attempt_at: None,
            last_error: None,
            sequence: 0,
        }
    }

    #[test]
    fn test_priority_band_ordering() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::High.to_string(), "high");
        assert_eq!(Priority::Medium.to_string(), "medium");
        assert_eq!(Priority::Low.to_string(), "low");
    }

    #[test]
    fn test_can_retry_respects_limit() {
        assert!(sample(0, 3).can_retry());
        assert!(sample(2, 3).can_retry());
        assert!(!sample(3, 3).can_retry());
    }

    #[test]
    fn test_is_due_with_future_gate() {
        let now = Utc::now();
        let mut req = sample(1, 3);

        assert!(req.is_due(now));

        req.next_attempt_at = Some(now + chrono::Duration::seconds(30));
        assert!(!req.is_due(now));

        req.next_attempt_at = Some(now);
        assert!(req.is_due(now));
    }

    #[test]
    fn test_backoff_grows_with_attempts() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(60);

        // Jitter adds at most 25%, so consecutive doublings stay ordered.
        let first = sample(0, 5).backoff_delay(base, max);
        let second = sample(1, 5).backoff_delay(base, max);
        let third = sample(2, 5).backoff_delay(base, max);

        assert!(first >= base);
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_backoff_is_capped() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(5);

        let delay = sample(10, 20).backoff_delay(base, max);

        // Cap plus at most 25% jitter.
        assert!(delay <= Duration::from_millis(6250));
    }

    #[test]
    fn test_zero_base_backoff_is_immediate() {
        let delay = sample(4, 5).backoff_delay(Duration::ZERO, Duration::from_secs(60));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_queued_request_serialization_round_trip() {
        let req = sample(1, 3);
        let encoded = serde_json::to_string(&req).expect("serializes");
        let decoded: QueuedRequest = serde_json::from_str(&encoded).expect("deserializes");
        assert_eq!(req, decoded);
    }
}
