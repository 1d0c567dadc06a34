//! Engine operations: pulls and builds as cancellable background tasks.
//!
//! [`EngineClient`] starts an operation and hands back an
//! [`OperationHandle`]. The running task owns the status record; callers see
//! copies through the handle or through an [`OperationObserver`].
//!
//! # Module structure
//! - `client` - `start_pull`, `cancel_pull`, `build_image`, `cancel_build`
//! - `registry` - token to cancellation-signal map
//! - `handle` - handle, observer and outcome types
//! - `request` - image references, build parameters, error bodies
//! - `runner` - the per-operation read loop

mod client;
mod handle;
mod registry;
mod request;
mod runner;

pub use client::EngineClient;
pub use handle::{OperationHandle, OperationObserver, OperationSnapshot, Outcome};
pub use registry::{CancelReceiver, OperationRegistry, OperationToken};
pub use request::{extract_error_message, BuildArg, BuildRequest, ImageReference};
