//! Request and transfer payloads exchanged with agents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Header map, keyed by header name (pseudo-headers such as `:path` included).
pub type Headers = BTreeMap<String, String>;

/// A unit of work handed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub headers: Headers,
    /// Transport-specific request options, passed through untouched.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
    /// Maximum time to wait for the response headers.
    pub response_timeout: Duration,
    /// Maximum time to wait for the full body once the response started.
    pub transfer_timeout: Duration,
}

impl TransferRequest {
    /// Create a request with no headers or options.
    pub fn new(response_timeout: Duration, transfer_timeout: Duration) -> Self {
        Self {
            headers: Headers::new(),
            options: serde_json::Map::new(),
            response_timeout,
            transfer_timeout,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a transport option.
    pub fn with_option(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Look up a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Timing and size information for a completed transfer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferStats {
    pub started_at: Option<SystemTime>,
    pub status: u16,
    pub bytes: u64,
    /// Time from sending the request to receiving the response headers.
    pub response_duration: Option<Duration>,
    /// Time from receiving the response headers to the end of the body.
    pub transfer_duration: Option<Duration>,
}

/// Result of a successful agent request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transfer {
    pub response_headers: Option<Headers>,
    pub stats: TransferStats,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Transfer {
    /// Build a transfer from a status code and body, filling `bytes` from the body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            response_headers: None,
            stats: TransferStats {
                status,
                bytes: body.len() as u64,
                ..Default::default()
            },
            body,
        }
    }
}
