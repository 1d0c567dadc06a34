//! Incremental decoder turning response-body chunks into JSON events.

use serde::de::DeserializeOwned;

use super::splitter::split_objects;
use super::unescape::unescape_unicode;

/// One fragment recovered from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// A fragment that parsed into an event.
    Event(T),
    /// A fragment that failed to parse. `raw` has `\uXXXX` escapes resolved.
    Malformed { raw: String, reason: String },
}

/// Stateful line buffer for an NDJSON-like byte stream.
///
/// Chunks may end anywhere, including in the middle of a UTF-8 sequence,
/// a JSON object or a line. Output depends only on the concatenated bytes,
/// never on where the chunk boundaries fell.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Undecoded tail of the last chunk (an incomplete UTF-8 sequence)
    pending: Vec<u8>,
    /// Text after the last newline seen so far
    buffer: String,
}

impl StreamDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk and return every fragment completed by it, in order.
    pub fn feed<T: DeserializeOwned>(&mut self, chunk: &[u8]) -> Vec<Decoded<T>> {
        self.pending.extend_from_slice(chunk);
        let text = take_utf8_prefix(&mut self.pending);
        self.buffer.push_str(&text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);

        complete
            .split('\n')
            .flat_map(|line| decode_line(line))
            .collect()
    }

    /// Flush whatever is buffered once the stream has ended.
    pub fn finish<T: DeserializeOwned>(&mut self) -> Vec<Decoded<T>> {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.buffer.push_str(&tail);
        }

        let residual = std::mem::take(&mut self.buffer);
        residual
            .split('\n')
            .flat_map(|line| decode_line(line))
            .collect()
    }

    /// Text currently held back waiting for a newline.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Drop all buffered state.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.buffer.clear();
    }
}

/// Split one complete line into objects and parse each independently.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Vec<Decoded<T>> {
    split_objects(line)
        .into_iter()
        .map(|fragment| match serde_json::from_str::<T>(fragment) {
            Ok(event) => Decoded::Event(event),
            Err(e) => {
                let raw = unescape_unicode(fragment);
                tracing::warn!(fragment = %raw, error = %e, "Skipping malformed stream fragment");
                Decoded::Malformed {
                    raw,
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}

/// Drain the longest valid UTF-8 prefix from `bytes`.
///
/// An incomplete multi-byte sequence at the end stays in `bytes` for the
/// next chunk. Invalid sequences are replaced with U+FFFD.
fn take_utf8_prefix(bytes: &mut Vec<u8>) -> String {
    let mut out = String::new();
    let mut consumed = 0;

    loop {
        match std::str::from_utf8(&bytes[consumed..]) {
            Ok(valid) => {
                out.push_str(valid);
                consumed = bytes.len();
                break;
            }
            Err(e) => {
                let valid_end = consumed + e.valid_up_to();
                // valid_up_to() guarantees this range is valid UTF-8
                out.push_str(&String::from_utf8_lossy(&bytes[consumed..valid_end]));
                match e.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        consumed = valid_end + len;
                    }
                    None => {
                        consumed = valid_end;
                        break;
                    }
                }
            }
        }
    }

    bytes.drain(..consumed);
    out
}
