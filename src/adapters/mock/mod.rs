//! Mock implementations for testing without a running engine.

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
