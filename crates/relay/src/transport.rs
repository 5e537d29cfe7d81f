//! Transport boundary.
//!
//! The executor and queue processor only require something that can turn a
//! `(url, method, headers, body)` descriptor into a response future; any
//! conforming client may be substituted. [`HttpTransport`] is the reqwest
//! implementation used in production; tests use
//! [`MockTransport`](crate::testing::MockTransport).
//!
//! The transport owns its own timeout. The queue and executor layers do
//! not impose a second one, to avoid double-timeout ambiguity.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// HTTP method of a relay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of a single API call.
///
/// This is the unit the executor dispatches and the queue stores for later
/// replay, so a replayed request takes exactly the path a live one does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub url: String,
    pub method: Method,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RelayRequest {
    /// Create a request with no headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: HashMap::new(), body: None }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Shorthand for a POST request with a JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Response returned by a transport on success.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl TransportResponse {
    /// Response with a 200 status and no body, the common case for
    /// fire-and-forget mobile submissions.
    pub fn ok() -> Self {
        Self { status: 200, body: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned status {status}")]
    Status { status: u16, body: Option<String> },

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// Whether the failure is plausibly transient and worth replaying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidBody(_) => false,
        }
    }
}

/// Minimal async HTTP contract required by the relay.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch a request and resolve with the response.
    ///
    /// Conforming implementations return `Err` for any non-2xx status so
    /// the caller can treat `Ok` as success.
    async fn send(&self, request: &RelayRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (for shared connection pools).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn method_of(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn map_error(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RelayRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.request(Self::method_of(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(Self::map_error)?;
        let status = response.status();
        let text = response.text().await.map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: if text.is_empty() { None } else { Some(text) },
            });
        }

        let body = if text.is_empty() {
            None
        } else {
            // Non-JSON bodies are preserved as strings rather than rejected.
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        debug!(url = %request.url, method = %request.method, status = status.as_u16(), "request dispatched");

        Ok(TransportResponse { status: status.as_u16(), body })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_request_builders() {
        let req = RelayRequest::post("https://api.example.com/attendance", json!({"present": true}))
            .with_header("Authorization", "Bearer t");

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer t"));
        assert!(req.body.is_some());
    }

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Connection("reset".to_string()).is_transient());
        assert!(TransportError::Status { status: 503, body: None }.is_transient());
        assert!(!TransportError::Status { status: 422, body: None }.is_transient());
        assert!(!TransportError::InvalidBody("junk".to_string()).is_transient());
    }

    #[test]
    fn test_request_serialization_round_trip() {
        let req = RelayRequest::post("https://api.example.com/leads", json!({"name": "A"}));
        let encoded = serde_json::to_string(&req).expect("serializes");
        let decoded: RelayRequest = serde_json::from_str(&encoded).expect("deserializes");
        assert_eq!(req, decoded);
    }
}
