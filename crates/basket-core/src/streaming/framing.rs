//! Incremental line framing for the update stream.
//!
//! The transport hands us arbitrary byte chunks. A line may span several
//! chunks (including a split inside a multibyte character), so bytes are
//! buffered until a newline arrives and only complete lines are decoded.

use serde_json::Value;
use tracing::debug;

use super::types::StreamEvent;

pub const DATA_PREFIX: &str = "data:";

/// Splits a byte stream into `data:` events.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order.
    /// A trailing partial line stays buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(event) = decode_line(&self.buffer[start..end]) {
                events.push(event);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        events
    }

    /// Bytes of an unfinished line still waiting for its newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Decode a single complete line (without its newline).
///
/// Returns None for anything that is not a `data:` line carrying a JSON
/// object: comments, other SSE fields, blank payloads, and malformed JSON
/// are all dropped without affecting the connection.
pub fn decode_line(line: &[u8]) -> Option<StreamEvent> {
    let line = String::from_utf8_lossy(line);
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(message @ Value::Object(_)) => Some(StreamEvent::new(message)),
        Ok(other) => {
            debug!(payload = %other, "ignoring non-object stream payload");
            None
        }
        Err(e) => {
            debug!(error = %e, "ignoring malformed stream payload");
            None
        }
    }
}
