//! Progress aggregation for pull and build streams.
//!
//! Each decoded [`ProgressMessage`] is folded into a status record that
//! observers receive as a full snapshot after every event.
//!
//! # Module structure
//! - `message` - typed event shape shared by both streams
//! - `pull` - per-layer map with byte totals, percent and speed
//! - `build` - flat, tagged log of build output

mod build;
mod message;
mod pull;

use std::fmt::Debug;
use std::time::Instant;

pub use build::{classify_status_line, classify_stream_line, BuildAggregator, BuildStatus, LogTag};
pub use message::{Aux, ErrorDetail, ProgressDetail, ProgressMessage};
pub use pull::{
    LayerProgress, OverallProgress, PullAggregator, PullStatus, DEFAULT_SPEED_WINDOW,
    TERMINAL_LAYER_STATUSES,
};

/// Folds a stream of events into a status record.
///
/// Once [`finish`](ProgressAggregator::finish) has run the record is frozen:
/// later events are ignored and `completed` stays true.
pub trait ProgressAggregator: Send + 'static {
    /// Snapshot type handed to observers.
    type Status: Clone + Debug + Send + Sync + 'static;

    /// Apply one decoded event. `now` drives any time-based metrics.
    fn apply(&mut self, msg: &ProgressMessage, now: Instant);

    /// Note a fragment that could not be parsed.
    fn record_malformed(&mut self, raw: &str);

    /// Current status record.
    fn status(&self) -> &Self::Status;

    /// Error set by an event or by [`finish`](ProgressAggregator::finish).
    fn error(&self) -> Option<&str>;

    fn is_completed(&self) -> bool;

    /// Mark the operation finished, optionally with a terminal error.
    /// Calling it again has no effect.
    fn finish(&mut self, error: Option<String>);
}
