//! HTTP client trait abstraction.
//!
//! The engine client only ever issues POST requests whose response bodies
//! are consumed incrementally, so the trait is a single streaming call.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered chunk by chunk, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// HTTP client errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Server answered with a non-2xx status. `message` is the raw response
    /// body.
    ServerError { status: u16, message: String },
    /// Request was cancelled
    Cancelled,
    /// Reading the body failed
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Cancelled => write!(f, "Request cancelled"),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations are the reqwest-based client used in production and
/// the mock client used in tests.
///
/// # Example
///
/// ```ignore
/// use berth::traits::{HttpClient, Headers};
///
/// async fn first_chunk<C: HttpClient>(client: &C) -> Option<Bytes> {
///     let mut body = client
///         .post_stream("http://localhost:2375/images/create?fromImage=alpine&tag=latest",
///                      Bytes::new(), &Headers::new())
///         .await
///         .ok()?;
///     body.next().await?.ok()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and return the response body as a stream.
    ///
    /// A non-2xx status is reported as [`HttpError::ServerError`] before any
    /// chunk is yielded.
    async fn post_stream(
        &self,
        url: &str,
        body: Bytes,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError>;
}
