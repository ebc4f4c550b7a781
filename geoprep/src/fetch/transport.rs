//! Transport abstraction for streamed downloads.
//!
//! The fetcher only needs "open a byte stream for this URL". Keeping that
//! behind a trait lets tests drive the fetcher with in-memory bodies and
//! scripted failures instead of a live server.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;

/// Open response body ready to be streamed.
pub struct TransportResponse {
    /// Value of the content-length header, when the server sent one.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    /// Create a response from any readable body.
    pub fn new(content_length: Option<u64>, body: impl Read + Send + 'static) -> Self {
        Self {
            content_length,
            body: Box::new(body),
        }
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Failures opening a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server reported the resource as absent (HTTP 404).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the timeout.
    #[error("timed out after {timeout_secs}s: {url}")]
    Timeout { url: String, timeout_secs: u64 },

    /// Connection-level failure.
    #[error("request to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// The transport could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Opens streamed GET requests.
pub trait Transport: Send + Sync {
    /// Open `url` for reading, failing if the server does not answer with a
    /// success status within `timeout`.
    fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse, TransportError>;
}
