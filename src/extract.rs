//! Strict JSON-array carving from free-form model output.
//!
//! Two steps, deliberately without repair or guessing:
//! 1. locate the span from the first `[` to the last `]`;
//! 2. parse that span strictly as a JSON array of objects.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Why an extraction produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The response was empty or whitespace-only.
    #[error("empty response")]
    EmptyResponse,

    /// No `[` … `]` span with the opening bracket first.
    #[error("could not find JSON array in response")]
    NoArray,

    /// The span is not valid JSON, or not an array of objects.
    #[error("invalid JSON array: {reason}")]
    InvalidJson {
        /// The serde error message.
        reason: String,
    },

    /// An element is an object but does not fit the target type.
    #[error("element {index} does not match the expected shape: {reason}")]
    ElementShape {
        /// Zero-based index of the offending element.
        index: usize,
        /// The serde error message.
        reason: String,
    },
}

/// The inclusive span from the first `[` to the last `]`.
///
/// # Examples
///
/// ```
/// use blogflow::extract::find_array_span;
///
/// assert_eq!(find_array_span("Here: [1, 2] done"), Some("[1, 2]"));
/// assert_eq!(find_array_span("] backwards ["), None);
/// ```
pub fn find_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Carve and parse a JSON array of objects into `Vec<T>`.
///
/// Every element must be a JSON object; each object is then deserialized
/// into `T`. Any failure rejects the whole array.
pub fn parse_object_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }
    let span = find_array_span(text).ok_or(ParseError::NoArray)?;

    let objects: Vec<Map<String, Value>> =
        serde_json::from_str(span).map_err(|e| ParseError::InvalidJson {
            reason: e.to_string(),
        })?;

    objects
        .into_iter()
        .enumerate()
        .map(|(index, obj)| {
            serde_json::from_value(Value::Object(obj)).map_err(|e| ParseError::ElementShape {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
