//! Mock HTTP client for testing.
//!
//! Returns canned chunk streams or errors per URL and records every request.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    /// Raw request body (a tar archive for builds).
    pub body: Bytes,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Fail the request before any body is returned
    Error(HttpError),
    /// Yield these chunks, then end the stream
    Stream(Vec<Bytes>),
    /// Yield these chunks, then fail with the error
    StreamThenError(Vec<Bytes>, HttpError),
    /// Yield these chunks, then stay open until dropped
    StreamPending(Vec<Bytes>),
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.set_response(
///     "http://localhost:2375/images/create",
///     MockResponse::Stream(vec![Bytes::from("{\"status\":\"Pulling\"}\n")]),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response for URLs equal to or starting with `url`.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Bytes) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: Bytes,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        self.record_request("POST", url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(err)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::StreamPending(chunks)) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok))
                    .chain(futures::stream::pending());
                Ok(Box::pin(stream))
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn collect(mut stream: ByteStream) -> Vec<Result<Bytes, HttpError>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_post_stream_with_chunks() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://engine/images/create",
            MockResponse::Stream(vec![Bytes::from("chunk1"), Bytes::from("chunk2")]),
        );

        let stream = client
            .post_stream("http://engine/images/create", Bytes::new(), &Headers::new())
            .await
            .unwrap();
        let items = collect(stream).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(Bytes::from("chunk1")));
        assert_eq!(items[1], Ok(Bytes::from("chunk2")));
    }

    #[tokio::test]
    async fn test_stream_then_error() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::StreamThenError(
            vec![Bytes::from("a")],
            HttpError::Io("reset".to_string()),
        ));

        let stream = client
            .post_stream("http://engine/build", Bytes::new(), &Headers::new())
            .await
            .unwrap();
        let items = collect(stream).await;

        assert_eq!(items, vec![Ok(Bytes::from("a")), Err(HttpError::Io("reset".to_string()))]);
    }

    #[tokio::test]
    async fn test_stream_pending_never_ends() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::StreamPending(vec![Bytes::from("a")]));

        let mut stream = client
            .post_stream("http://engine/build", Bytes::new(), &Headers::new())
            .await
            .unwrap();
        assert_eq!(stream.next().await, Some(Ok(Bytes::from("a"))));

        let next = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_error_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://engine/images/create",
            MockResponse::Error(HttpError::ServerError {
                status: 404,
                message: "not found".to_string(),
            }),
        );

        let result = client
            .post_stream("http://engine/images/create?fromImage=x", Bytes::new(), &Headers::new())
            .await;
        assert!(matches!(result, Err(HttpError::ServerError { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client
            .post_stream("http://engine/missing", Bytes::new(), &Headers::new())
            .await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_requests_recorded_with_body() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Stream(vec![]));

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/x-tar".to_string());
        client
            .post_stream("http://engine/build", Bytes::from_static(&[0u8; 4]), &headers)
            .await
            .unwrap();

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].body.len(), 4);
        assert_eq!(
            requests[0].headers.get("Content-Type").map(String::as_str),
            Some("application/x-tar")
        );

        client.clear_requests();
        assert!(client.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Stream(vec![]));
        let cloned = client.clone();

        cloned
            .post_stream("http://engine/x", Bytes::new(), &Headers::new())
            .await
            .unwrap();
        assert_eq!(client.get_requests().len(), 1);
    }
}
