//! Decoding of the engine's NDJSON-like progress streams.
//!
//! Pull and build endpoints answer with a long-lived body of JSON objects,
//! normally one per line but sometimes several on the same line. Bytes
//! arrive in arbitrary chunks.
//!
//! # Module structure
//! - `splitter` - brace/string-aware splitting of one line into objects
//! - `decoder` - chunk buffering, line splitting and per-fragment parsing
//! - `unescape` - `\uXXXX` resolution used for readable diagnostics

mod decoder;
mod splitter;
mod unescape;

pub use decoder::{decode_line, Decoded, StreamDecoder};
pub use splitter::split_objects;
pub use unescape::unescape_unicode;
