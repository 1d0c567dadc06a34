//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - streaming POST requests to the container engine

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError};
