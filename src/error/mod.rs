//! Error handling for berth.
//!
//! - **Error Categories**: high-level classification for handling decisions
//! - **Domain errors**: [`NetworkError`] before the stream starts, [`StreamError`] after
//! - **Unified Error Type**: [`BerthError`] is what observers and handles report
//! - **Error Context**: operation, token and image attached for logging
//!
//! # Example
//!
//! ```ignore
//! use berth::error::{BerthResult, ErrorContext, ResultExt};
//!
//! fn read_recipe(path: &Path) -> BerthResult<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| ErrorContext::new("read_recipe"))
//! }
//! ```
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout | Yes |
//! | Server | Engine rejected or reported an error | Sometimes |
//! | User | Cancelled by the caller | No |
//! | System | Filesystem errors | No |
//! | Configuration | Bad URL or arguments | No |

mod berth_error;
mod category;
mod context;
mod network;
mod result;
mod stream;

pub use berth_error::BerthError;
pub use category::ErrorCategory;
pub use context::ErrorContext;
pub use network::{classify_http_error, NetworkError};
pub use result::{BerthResult, ResultExt};
pub use stream::{StreamError, CANCELLED_MESSAGE};

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_error_unification() {
        let errors: Vec<BerthError> = vec![
            NetworkError::Timeout {
                message: "30s".to_string(),
            }
            .into(),
            StreamError::EngineReported {
                message: "denied".to_string(),
            }
            .into(),
            StreamError::Cancelled.into(),
            BerthError::config("missing recipe"),
            std::io::Error::new(std::io::ErrorKind::Other, "disk").into(),
        ];

        for err in &errors {
            assert!(!err.error_code().is_empty());
            assert!(!err.status_message().is_empty());
            assert!(!err.recovery_hint().is_empty());
        }
    }

    #[test]
    fn test_context_propagation() {
        let err: BerthError = NetworkError::ConnectionFailed {
            url: "http://localhost:2375".to_string(),
            message: "refused".to_string(),
        }
        .into();

        let with_ctx = err.with_context(
            ErrorContext::new("pull")
                .with_operation_token("tok")
                .with_image("alpine:latest"),
        );

        let ctx = with_ctx.context().unwrap();
        assert_eq!(ctx.operation, "pull");
        assert_eq!(ctx.image.as_deref(), Some("alpine:latest"));
        assert_eq!(with_ctx.category(), ErrorCategory::Network);
        assert!(with_ctx.is_retryable());
    }

    #[test]
    fn test_retry_logic() {
        let retryable: Vec<BerthError> = vec![
            NetworkError::Timeout {
                message: "t".to_string(),
            }
            .into(),
            StreamError::ConnectionLost {
                message: "eof".to_string(),
            }
            .into(),
        ];
        for err in retryable {
            assert!(err.is_retryable(), "Expected {:?} to be retryable", err);
        }

        let final_errors: Vec<BerthError> = vec![
            StreamError::Cancelled.into(),
            StreamError::EngineReported {
                message: "x".to_string(),
            }
            .into(),
            BerthError::config("bad"),
        ];
        for err in final_errors {
            assert!(!err.is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }
}
