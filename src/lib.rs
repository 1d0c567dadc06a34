//! berth - streaming pull and build client for a container engine.
//!
//! The engine reports pull and build progress as a stream of JSON objects.
//! [`stream`] turns arbitrary body chunks back into objects, [`progress`]
//! folds them into per-operation status, and [`engine`] runs each
//! operation on its own task with cancellation. [`archive`] produces the
//! tar build context sent with a build.

pub mod adapters;
pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod stream;
pub mod traits;
