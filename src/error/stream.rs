//! Streaming-related error types.
//!
//! Errors raised after a pull or build stream has started.

use thiserror::Error;

/// Fixed message recorded when an operation is cancelled.
pub const CANCELLED_MESSAGE: &str = "operation cancelled";

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// The engine sent an `error` / `errorDetail` event.
    #[error("{message}")]
    EngineReported { message: String },

    /// Reading the response body failed mid-stream.
    #[error("Stream connection lost: {message}")]
    ConnectionLost { message: String },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}

impl StreamError {
    /// Check if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StreamError::ConnectionLost { .. })
    }

    /// Message for the status record and for display.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::EngineReported { message } => message.clone(),
            StreamError::ConnectionLost { message } => {
                format!("Connection to the engine was lost: {}", message)
            }
            StreamError::Cancelled => CANCELLED_MESSAGE.to_string(),
        }
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::EngineReported { .. } => "E_STREAM_ENGINE",
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::Cancelled => "E_STREAM_CANCEL",
        }
    }
}
