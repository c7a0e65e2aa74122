//! SSE decoder for Gemini's `streamGenerateContent?alt=sse` responses.
//!
//! Each `data:` event is a full `GenerateContentResponse` JSON object; the
//! text lives in `candidates[0].content.parts[*].text`. An event carrying
//! an `error` object ends the stream with a read failure.

use serde_json::Value;

use crate::error::{BlogflowError, Result};
use crate::streaming::{drain_lines, ChunkDecoder};

/// Line-buffered SSE decoder yielding Gemini text fragments.
///
/// # Example
///
/// ```
/// use blogflow::backend::sse::GeminiSseDecoder;
///
/// let mut decoder = GeminiSseDecoder::new();
/// let data = b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n";
/// assert_eq!(decoder.decode(data).unwrap(), vec!["Hello".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct GeminiSseDecoder {
    buffer: Vec<u8>,
}

impl GeminiSseDecoder {
    /// Create a new empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; return the text of every complete event.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);
        let mut texts = Vec::new();
        for line in drain_lines(&mut self.buffer) {
            if let Some(text) = Self::decode_line(&line)? {
                texts.push(text);
            }
        }
        Ok(texts)
    }

    /// Decode whatever remains after the byte stream ends.
    pub fn flush(&mut self) -> Result<Vec<String>> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        Ok(Self::decode_line(&rest)?.into_iter().collect())
    }

    fn decode_line(line: &str) -> Result<Option<String>> {
        let Some(data) = line
            .strip_prefix("data: ")
            .or_else(|| line.strip_prefix("data:"))
        else {
            // Blank keep-alives, `event:` and `id:` lines.
            return Ok(None);
        };

        let Ok(event) = serde_json::from_str::<Value>(data.trim()) else {
            return Ok(None);
        };

        if let Some(err) = event.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(BlogflowError::StreamRead(message));
        }

        Ok(extract_text(&event))
    }
}

impl ChunkDecoder for GeminiSseDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        GeminiSseDecoder::decode(self, chunk)
    }

    fn flush(&mut self) -> Result<Vec<String>> {
        GeminiSseDecoder::flush(self)
    }
}

/// Concatenate the text parts of the first candidate, if any.
pub(crate) fn extract_text(event: &Value) -> Option<String> {
    let parts = event.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
