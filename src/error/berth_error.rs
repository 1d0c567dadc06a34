//! Unified error type for the crate.

use std::fmt;

use super::category::ErrorCategory;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::stream::StreamError;
use crate::traits::HttpError;

/// Unified error type.
///
/// Every terminal failure of a pull or build ends up here: transport
/// errors, engine-reported errors and cancellation alike.
#[derive(Debug, Clone, PartialEq)]
pub enum BerthError {
    /// Connection and HTTP-level errors.
    Network(NetworkError),

    /// Errors raised while a progress stream is running.
    Stream(StreamError),

    /// Filesystem errors (reading a recipe file, for example).
    System { message: String },

    /// Invalid configuration or arguments.
    Config { message: String },

    /// Wrapped error with additional context.
    WithContext {
        error: Box<BerthError>,
        context: ErrorContext,
    },
}

impl BerthError {
    pub fn config(message: impl Into<String>) -> Self {
        BerthError::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BerthError::Network(NetworkError::Cancelled) => ErrorCategory::User,
            BerthError::Network(NetworkError::HttpStatus { .. }) => ErrorCategory::Server,
            BerthError::Network(_) => ErrorCategory::Network,
            BerthError::Stream(err) => match err {
                StreamError::EngineReported { .. } => ErrorCategory::Server,
                StreamError::ConnectionLost { .. } => ErrorCategory::Network,
                StreamError::Cancelled => ErrorCategory::User,
            },
            BerthError::System { .. } => ErrorCategory::System,
            BerthError::Config { .. } => ErrorCategory::Configuration,
            BerthError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            BerthError::Network(err) => err.is_retryable(),
            BerthError::Stream(err) => err.is_retryable(),
            BerthError::System { .. } | BerthError::Config { .. } => false,
            BerthError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Whether the operation ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.inner(),
            BerthError::Stream(StreamError::Cancelled) | BerthError::Network(NetworkError::Cancelled)
        )
    }

    /// Text stored in a status record's `error` field.
    pub fn status_message(&self) -> String {
        match self.inner() {
            BerthError::Network(err) => err.user_message(),
            BerthError::Stream(err) => err.user_message(),
            BerthError::System { message } | BerthError::Config { message } => message.clone(),
            BerthError::WithContext { error, .. } => error.status_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            BerthError::Network(err) => err.error_code(),
            BerthError::Stream(err) => err.error_code(),
            BerthError::System { .. } => "E_SYS",
            BerthError::Config { .. } => "E_CONFIG",
            BerthError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        BerthError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            BerthError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &BerthError {
        match self {
            BerthError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for BerthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BerthError::Network(err) => write!(f, "{}", err),
            BerthError::Stream(err) => write!(f, "{}", err),
            BerthError::System { message } => write!(f, "System error: {}", message),
            BerthError::Config { message } => write!(f, "Configuration error: {}", message),
            BerthError::WithContext { error, context } => write!(f, "{} ({})", error, context),
        }
    }
}

impl std::error::Error for BerthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BerthError::Network(err) => Some(err),
            BerthError::Stream(err) => Some(err),
            BerthError::System { .. } | BerthError::Config { .. } => None,
            BerthError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for BerthError {
    fn from(err: NetworkError) -> Self {
        BerthError::Network(err)
    }
}

impl From<StreamError> for BerthError {
    fn from(err: StreamError) -> Self {
        BerthError::Stream(err)
    }
}

impl From<HttpError> for BerthError {
    fn from(err: HttpError) -> Self {
        BerthError::Network(super::network::classify_http_error(err, "unknown"))
    }
}

impl From<std::io::Error> for BerthError {
    fn from(err: std::io::Error) -> Self {
        BerthError::System {
            message: err.to_string(),
        }
    }
}
