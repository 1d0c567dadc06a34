//! Drive loop shared by pulls and builds.
//!
//! One task per operation: issue the request, feed each body chunk through
//! a [`StreamDecoder`], fold decoded events into the aggregator and publish
//! a snapshot after each one. Cancellation is checked before every read.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::watch;

use super::handle::{OperationObserver, OperationSnapshot, Outcome};
use super::registry::{CancelReceiver, OperationRegistry, OperationToken};
use super::request::extract_error_message;
use crate::error::{classify_http_error, BerthError, ErrorContext, NetworkError, StreamError};
use crate::progress::{ProgressAggregator, ProgressMessage};
use crate::stream::{Decoded, StreamDecoder};
use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// Outgoing request for one operation.
#[derive(Debug, Clone)]
pub(crate) struct EngineRequest {
    pub url: String,
    pub body: Bytes,
    pub headers: Headers,
    /// Characters of a non-JSON error body to keep
    pub error_display_limit: usize,
}

/// State owned by a single running operation.
pub(crate) struct Operation<A, O>
where
    A: ProgressAggregator,
{
    pub token: OperationToken,
    /// `"pull"` or `"build"`, for logs and error context
    pub kind: &'static str,
    /// Image reference or tag, for logs and error context
    pub subject: String,
    pub aggregator: A,
    pub observer: O,
    pub registry: OperationRegistry,
    pub state: watch::Sender<OperationSnapshot<A::Status>>,
}

impl<A, O> Operation<A, O>
where
    A: ProgressAggregator,
    O: OperationObserver<A::Status>,
{
    /// Run to completion. Every exit path goes through `finalize`.
    pub(crate) async fn run<C>(
        mut self,
        http: Arc<C>,
        request: EngineRequest,
        mut cancel: CancelReceiver,
    ) where
        C: HttpClient + ?Sized,
    {
        tracing::info!(
            token = %self.token,
            kind = self.kind,
            subject = %self.subject,
            "Operation started"
        );

        let response = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => None,
            response = http.post_stream(&request.url, request.body.clone(), &request.headers) => {
                Some(response)
            }
        };

        let result = match response {
            None => Err(StreamError::Cancelled.into()),
            Some(Err(err)) => Err(request_error(err, &request)),
            Some(Ok(body)) => self.drive(body, &mut cancel).await,
        };

        self.finalize(result);
    }

    async fn drive(
        &mut self,
        mut body: ByteStream,
        cancel: &mut CancelReceiver,
    ) -> Result<(), BerthError> {
        let mut decoder = StreamDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled(cancel) => return Err(StreamError::Cancelled.into()),
                chunk = body.next() => chunk,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = decoder.feed::<ProgressMessage>(&chunk);
                    if let Some(message) = self.dispatch(events) {
                        return Err(StreamError::EngineReported { message }.into());
                    }
                }
                Some(Err(err)) => return Err(stream_error(err)),
                None => {
                    let events = decoder.finish::<ProgressMessage>();
                    return match self.dispatch(events) {
                        Some(message) => Err(StreamError::EngineReported { message }.into()),
                        None => Ok(()),
                    };
                }
            }
        }
    }

    /// Apply decoded items in order. Stops at the first engine-reported
    /// error and returns its message.
    fn dispatch(&mut self, events: Vec<Decoded<ProgressMessage>>) -> Option<String> {
        for event in events {
            match event {
                Decoded::Event(msg) => {
                    tracing::debug!(token = %self.token, ?msg, "Decoded event");
                    self.aggregator.apply(&msg, Instant::now());
                    if let Some(error) = self.aggregator.error() {
                        return Some(error.to_string());
                    }
                }
                Decoded::Malformed { raw, .. } => self.aggregator.record_malformed(&raw),
            }
            self.publish_progress();
        }
        None
    }

    fn publish_progress(&mut self) {
        let status = self.aggregator.status().clone();
        self.observer.on_progress(&status);
        self.state.send_replace(OperationSnapshot {
            status,
            outcome: None,
        });
    }

    fn finalize(mut self, result: Result<(), BerthError>) {
        self.registry.remove(&self.token);

        let outcome = match result {
            Ok(()) => {
                self.aggregator.finish(None);
                let status = self.aggregator.status().clone();
                tracing::info!(token = %self.token, kind = self.kind, "Operation completed");
                self.observer.on_complete(&status);
                OperationSnapshot {
                    status,
                    outcome: Some(Outcome::Completed),
                }
            }
            Err(err) => {
                let mut context =
                    ErrorContext::new(self.kind).with_operation_token(self.token.to_string());
                if !self.subject.is_empty() {
                    context = context.with_image(self.subject.clone());
                }
                let err = err.with_context(context);

                self.aggregator.finish(Some(err.status_message()));
                let status = self.aggregator.status().clone();
                if err.is_cancelled() {
                    tracing::info!(token = %self.token, kind = self.kind, "Operation cancelled");
                } else {
                    tracing::warn!(
                        token = %self.token,
                        kind = self.kind,
                        code = err.error_code(),
                        error = %err,
                        "Operation failed"
                    );
                }
                self.observer.on_error(&err, &status);
                OperationSnapshot {
                    status,
                    outcome: Some(Outcome::Failed(err)),
                }
            }
        };

        self.state.send_replace(outcome);
    }
}

/// Resolves once cancellation is signalled. Never resolves if the sender
/// is gone without signalling.
async fn cancelled(cancel: &mut CancelReceiver) {
    let closed = cancel.wait_for(|flag| *flag).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

/// Failure before any body was received.
fn request_error(err: HttpError, request: &EngineRequest) -> BerthError {
    match err {
        HttpError::ServerError { status, message } => NetworkError::HttpStatus {
            status,
            message: extract_error_message(status, &message, request.error_display_limit),
        }
        .into(),
        other => classify_http_error(other, &request.url).into(),
    }
}

/// Failure while reading the body.
fn stream_error(err: HttpError) -> BerthError {
    match err {
        HttpError::Cancelled => StreamError::Cancelled.into(),
        other => StreamError::ConnectionLost {
            message: other.to_string(),
        }
        .into(),
    }
}
