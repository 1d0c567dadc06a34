//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use berth::adapters::{MockHttpClient, MockResponse};
use berth::config::EngineConfig;
use berth::engine::{EngineClient, OperationObserver};
use berth::error::BerthError;

/// Everything an observer was told, in call order.
#[derive(Debug)]
pub struct Recorded<S> {
    pub progress: Vec<S>,
    pub completed: Vec<S>,
    pub errors: Vec<(BerthError, S)>,
}

impl<S> Default for Recorded<S> {
    fn default() -> Self {
        Self {
            progress: Vec::new(),
            completed: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Observer that stores every callback for later assertions.
#[derive(Debug)]
pub struct RecordingObserver<S> {
    inner: Arc<Mutex<Recorded<S>>>,
}

impl<S> Clone for RecordingObserver<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> RecordingObserver<S> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&Recorded<S>) -> R) -> R {
        f(&self.inner.lock().unwrap())
    }

    pub fn progress_count(&self) -> usize {
        self.with(|r| r.progress.len())
    }

    pub fn error_count(&self) -> usize {
        self.with(|r| r.errors.len())
    }

    pub fn complete_count(&self) -> usize {
        self.with(|r| r.completed.len())
    }
}

impl<S: Clone + Send + 'static> OperationObserver<S> for RecordingObserver<S> {
    fn on_progress(&mut self, status: &S) {
        self.inner.lock().unwrap().progress.push(status.clone());
    }

    fn on_complete(&mut self, status: &S) {
        self.inner.lock().unwrap().completed.push(status.clone());
    }

    fn on_error(&mut self, error: &BerthError, status: &S) {
        self.inner
            .lock()
            .unwrap()
            .errors
            .push((error.clone(), status.clone()));
    }
}

/// Config whose speed metric never updates during a test.
pub fn test_config() -> EngineConfig {
    EngineConfig::default().with_speed_window(Duration::from_secs(3600))
}

/// Engine backed by a mock; the returned mock shares state with the engine's.
pub fn mock_engine() -> (EngineClient<MockHttpClient>, MockHttpClient) {
    let http = MockHttpClient::new();
    let engine = EngineClient::new(http.clone(), test_config());
    (engine, http)
}

/// Byte chunks from string slices.
pub fn chunks(parts: &[&str]) -> Vec<Bytes> {
    parts.iter().map(|part| Bytes::from(part.to_string())).collect()
}

pub fn stream(parts: &[&str]) -> MockResponse {
    MockResponse::Stream(chunks(parts))
}

/// Split `payload` into two chunks at byte `at`.
pub fn split_at(payload: &str, at: usize) -> Vec<Bytes> {
    let bytes = payload.as_bytes();
    vec![
        Bytes::copy_from_slice(&bytes[..at]),
        Bytes::copy_from_slice(&bytes[at..]),
    ]
}
