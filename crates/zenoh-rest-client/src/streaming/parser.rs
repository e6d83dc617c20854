//! Incremental parser for the text/event-stream wire format
//!
//! The stream is unbounded, so frames are assembled from whatever bytes have
//! arrived so far; the parser never waits for end-of-stream.

use tracing::{trace, warn};

/// One complete server-sent event frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event type, if the frame carried an `event:` field
    pub event: Option<String>,
    /// Event id, if the frame carried an `id:` field
    pub id: Option<String>,
    /// Accumulated data payload (multiple `data:` lines joined with `\n`)
    pub data: String,
}

/// SSE parser state
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes of a not-yet-complete line
    buffer: Vec<u8>,
    /// Data accumulated for the frame in progress
    data: String,
    /// Event type of the frame in progress
    event: Option<String>,
    /// Id of the frame in progress
    id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser, returning any frames they complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = &line[..line.len() - 1];
            // Tolerate \r\n line endings
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Process a single line; a blank line completes the frame in progress
    fn process_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        if line.is_empty() {
            return self.take_frame();
        }

        // Comment line, typically a keepalive
        if line.starts_with(b":") {
            trace!("sse keepalive/comment");
            return None;
        }

        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(_) => {
                warn!("skipping sse line with invalid utf-8");
                return None;
            }
        };

        // Split "field: value" on the first colon; the value's single
        // leading space is not part of the payload
        let (field, value) = match line.find(':') {
            Some(pos) => {
                let (field, value) = line.split_at(pos);
                let value = &value[1..];
                (field, value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "retry" => {
                // Reconnection is a caller concern, not ours
                trace!(retry = value, "ignoring sse retry field");
            }
            other => {
                trace!(field = other, "ignoring unknown sse field");
            }
        }

        None
    }

    /// Take the frame in progress, if it carried any data
    fn take_frame(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            id,
            data: std::mem::take(&mut self.data),
        })
    }
}
