//! Line parser for the ask event stream
//!
//! The ask endpoint writes one record per line, `data: <json>`. Records are
//! parsed as soon as their newline arrives; whatever is left when the body
//! ends is parsed as a final record. Malformed records are dropped.

use tracing::{debug, trace};

use super::types::AskStreamEvent;

const DATA_PREFIX: &str = "data: ";

/// Incremental parser state
#[derive(Debug, Default)]
pub struct DataLineParser {
    /// Bytes of the current, incomplete line
    buffer: Vec<u8>,
}

impl DataLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and extract the events of every completed line
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<AskStreamEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(event) = parse_line(line) {
                events.push(event);
            }
        }

        events
    }

    /// Parse the trailing partial line, if any, once the body has ended
    pub fn finish(&mut self) -> Option<AskStreamEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        parse_line(line)
    }

    /// Bytes buffered but not yet terminated by a newline
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_line(line: &[u8]) -> Option<AskStreamEvent> {
    if line.is_empty() {
        return None;
    }

    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(e) => {
            debug!("Skipping ask record with invalid UTF-8: {}", e);
            return None;
        }
    };
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        trace!("Ignoring non-data line: {}", line);
        return None;
    };

    match serde_json::from_str::<AskStreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            let preview: String = payload.chars().take(100).collect();
            debug!("Skipping malformed ask record: {} (data: {})", e, preview);
            None
        }
    }
}
