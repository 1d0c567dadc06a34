//! Error context for enriched error information.

use chrono::{DateTime, Utc};

/// Where and when an error happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// Human-readable description of the operation that failed.
    pub operation: String,

    /// Token of the pull or build the error belongs to.
    pub operation_token: Option<String>,

    /// Image reference or tag involved.
    pub image: Option<String>,

    /// Timestamp when the error occurred.
    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    /// Create a new ErrorContext for an operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            operation_token: None,
            image: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_operation_token(mut self, token: impl Into<String>) -> Self {
        self.operation_token = Some(token.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Get a formatted context string suitable for logging.
    pub fn to_log_string(&self) -> String {
        let mut parts = vec![format!("operation={}", self.operation)];

        if let Some(ref token) = self.operation_token {
            parts.push(format!("token={}", token));
        }

        if let Some(ref image) = self.image {
            parts.push(format!("image={}", image));
        }

        parts.push(format!("timestamp={}", self.timestamp.to_rfc3339()));

        parts.join(" ")
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.operation)?;

        if let Some(ref image) = self.image {
            write!(f, " image={}", image)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = ErrorContext::new("pull")
            .with_operation_token("abc")
            .with_image("nginx:alpine");

        assert_eq!(ctx.operation, "pull");
        assert_eq!(ctx.operation_token.as_deref(), Some("abc"));
        assert_eq!(ctx.image.as_deref(), Some("nginx:alpine"));
        assert_eq!(ctx.to_string(), "[pull] image=nginx:alpine");
    }

    #[test]
    fn test_log_string() {
        let log = ErrorContext::new("build").with_operation_token("t-1").to_log_string();
        assert!(log.starts_with("operation=build token=t-1 timestamp="));
    }
}
