//! Result type alias for berth operations.

use super::berth_error::BerthError;
use super::context::ErrorContext;

/// Type alias for Results using BerthError.
pub type BerthResult<T> = Result<T, BerthError>;

/// Extension trait for Result types to add context to errors.
pub trait ResultExt<T> {
    /// Add context to an error if the result is Err.
    fn context(self, ctx: ErrorContext) -> BerthResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> BerthResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BerthError>,
{
    fn context(self, ctx: ErrorContext) -> BerthResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> BerthResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
