//! Event Frame Parsing
//!
//! Splits the raw event-stream bytes into lines and extracts changed image ids.

/// Prefix of a line that carries a changed image id
pub const DATA_PREFIX: &str = "data:";

/// Extracts the image id from a `data:` line.
///
/// Returns `None` for comments, other fields, blank lines and empty ids.
pub fn parse_event_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let id = line.strip_prefix(DATA_PREFIX)?.trim();
    (!id.is_empty()).then_some(id)
}

// == Event Line Buffer ==
/// Reassembles lines that are split across network chunks.
#[derive(Debug, Default)]
pub struct EventLineBuffer {
    pending: Vec<u8>,
}

impl EventLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the ids of every complete `data:` line in it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut ids = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(id) = parse_event_line(&line) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    /// Bytes waiting for a line terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
