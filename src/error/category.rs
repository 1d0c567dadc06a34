//! Error category classification.
//!
//! Categories give callers one place to decide how to present a failure
//! and whether trying again could help. This crate never retries on its own.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection refused, DNS, timeouts, dropped streams.
    Network,

    /// The engine rejected the request or reported a failure in the stream.
    Server,

    /// The user cancelled or gave invalid input.
    User,

    /// Filesystem and OS errors.
    System,

    /// Invalid or missing configuration.
    Configuration,
}

impl ErrorCategory {
    /// Whether a caller may reasonably try the operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::User => "user",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Suggested next step for the user.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the container engine is reachable and try again",
            ErrorCategory::Server => "Check the engine logs and the request parameters",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Check BERTH_* environment variables",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
