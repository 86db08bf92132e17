//! Captured output buffers.

use std::fmt;

/// Append-only text captured from one output stream.
///
/// Each buffer has exactly one writer: the drain attached to its stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line followed by a `\n` terminator.
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// The captured text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the captured text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate over the captured lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }
}

impl fmt::Display for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<OutputBuffer> for String {
    fn from(buffer: OutputBuffer) -> Self {
        buffer.text
    }
}

/// Decode one raw line read from a pipe.
///
/// Strips the trailing `\n` and an optional `\r`, replacing invalid UTF-8.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
