//! Line framing for text streams relayed over an HTTP hop.
//!
//! A relay forwards provider output as newline-terminated lines, each a
//! tag followed by a JSON value. Text fragments use the `0:` tag:
//!
//! ```text
//! 0:"<h1>The Future"
//! 0:" of Coding</h1>"
//! ```
//!
//! Lines with other tags are ignored. Malformed lines are skipped without
//! error, so a stray fragment never aborts a generation.

use futures::Stream;

use crate::error::Result;
use crate::streaming::{decode_byte_stream, drain_lines, ChunkDecoder, TextStream};

/// Tag prefix for text fragments.
pub const TEXT_PART_TAG: &str = "0:";

/// Encode one text fragment as a framed line.
///
/// # Example
///
/// ```
/// use blogflow::framing::encode_text_part;
///
/// assert_eq!(encode_text_part("say \"hi\"\n"), "0:\"say \\\"hi\\\"\\n\"\n");
/// ```
pub fn encode_text_part(fragment: &str) -> String {
    // Serializing a &str cannot fail.
    let quoted = serde_json::to_string(fragment).unwrap_or_default();
    format!("{}{}\n", TEXT_PART_TAG, quoted)
}

/// Buffered decoder for `0:`-framed text streams.
///
/// Bytes are buffered until a newline completes the line, so fragments
/// split across network reads decode correctly.
///
/// # Example
///
/// ```
/// use blogflow::framing::DataStreamDecoder;
///
/// let mut decoder = DataStreamDecoder::new();
/// assert!(decoder.decode(b"0:\"Hel").is_empty());
/// assert_eq!(decoder.decode(b"lo\"\n"), vec!["Hello".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct DataStreamDecoder {
    buffer: Vec<u8>,
}

impl DataStreamDecoder {
    /// Create a new empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the text of every complete `0:` line.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        drain_lines(&mut self.buffer)
            .iter()
            .filter_map(|line| parse_text_line(line))
            .collect()
    }

    /// Decode a trailing line that was not newline-terminated.
    pub fn flush(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        parse_text_line(&rest)
    }
}

impl ChunkDecoder for DataStreamDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        Ok(DataStreamDecoder::decode(self, chunk))
    }

    fn flush(&mut self) -> Result<Vec<String>> {
        Ok(DataStreamDecoder::flush(self).into_iter().collect())
    }
}

/// Parse one framed line; `None` for other tags or malformed payloads.
fn parse_text_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(TEXT_PART_TAG)?;
    serde_json::from_str::<String>(payload).ok()
}

/// Adapt a framed byte stream (e.g. `reqwest::Response::bytes_stream`)
/// into a [`TextStream`] of unescaped fragments.
pub fn decode_framed<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: std::fmt::Display + 'static,
{
    decode_byte_stream(bytes, DataStreamDecoder::new())
}
