//! Incremental text streams and the accumulate-and-publish consumer.
//!
//! Every backend hands back a [`TextStream`]: a boxed stream of decoded text
//! fragments. [`consume_stream`] folds it into a growing `String`, publishing
//! the complete-so-far value after every fragment.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

use crate::error::{BlogflowError, Result};

/// A live, incrementally readable text response.
///
/// Items are decoded text fragments in arrival order. An `Err` item is
/// terminal: no further items follow it.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Build a [`TextStream`] from in-memory fragments.
///
/// # Example
///
/// ```
/// use blogflow::streaming::{consume_stream, text_stream};
///
/// # tokio_test::block_on(async {
/// let stream = text_stream(vec!["<h1>Hi".to_string(), "</h1>".to_string()]);
/// let text = consume_stream(stream, &mut |_| {}).await.unwrap();
/// assert_eq!(text, "<h1>Hi</h1>");
/// # });
/// ```
pub fn text_stream(fragments: Vec<String>) -> TextStream {
    stream::iter(fragments.into_iter().map(Ok)).boxed()
}

/// Read `stream` to completion, publishing the accumulated text after
/// each non-empty fragment.
///
/// The observer always receives the full value so far, never a diff, so
/// each published value extends the previous one. On a read failure the
/// partial text is dropped and [`BlogflowError::StreamRead`] is returned.
pub async fn consume_stream(
    mut stream: TextStream,
    on_update: &mut (dyn FnMut(&str) + Send),
) -> Result<String> {
    let mut accumulated = String::new();

    while let Some(fragment) = stream.next().await {
        let fragment = fragment.map_err(into_stream_read)?;
        if fragment.is_empty() {
            continue;
        }
        accumulated.push_str(&fragment);
        on_update(&accumulated);
    }

    Ok(accumulated)
}

fn into_stream_read(err: BlogflowError) -> BlogflowError {
    match err {
        BlogflowError::StreamRead(_) => err,
        other => BlogflowError::StreamRead(other.message()),
    }
}

/// A line decoder that turns raw network bytes into text fragments.
///
/// Implementations buffer partial lines across reads; `flush` is called
/// once after the byte stream ends.
pub(crate) trait ChunkDecoder: Send + 'static {
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>>;
    fn flush(&mut self) -> Result<Vec<String>>;
}

/// Split complete `\n`-terminated lines off the front of `buffer`.
///
/// Bytes after the last newline stay buffered, so a multi-byte UTF-8
/// character split across reads is decoded intact once its line completes.
pub(crate) fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&line).trim().to_string());
    }
    lines
}

struct DecodeState<D> {
    bytes: BoxStream<'static, std::result::Result<Vec<u8>, String>>,
    decoder: D,
    pending: VecDeque<String>,
    finished: bool,
}

/// Adapt a raw byte stream into a [`TextStream`] using `decoder`.
///
/// A transport error from the byte stream becomes a terminal
/// [`BlogflowError::StreamRead`] item.
pub(crate) fn decode_byte_stream<S, B, E, D>(bytes: S, decoder: D) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: std::fmt::Display + 'static,
    D: ChunkDecoder,
{
    let bytes = bytes
        .map(|item| item.map(|b| b.as_ref().to_vec()).map_err(|e| e.to_string()))
        .boxed();
    let state = DecodeState {
        bytes,
        decoder,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(text) = st.pending.pop_front() {
                return Some((Ok(text), st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => match st.decoder.decode(&chunk) {
                    Ok(texts) => st.pending.extend(texts),
                    Err(e) => {
                        st.finished = true;
                        return Some((Err(e), st));
                    }
                },
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(BlogflowError::StreamRead(e)), st));
                }
                None => {
                    st.finished = true;
                    match st.decoder.flush() {
                        Ok(texts) => st.pending.extend(texts),
                        Err(e) => return Some((Err(e), st)),
                    }
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accumulation_is_prefix_monotonic() {
        let stream = text_stream(vec![
            "<h1>".into(),
            "Hello".into(),
            "".into(),
            "</h1><p>".into(),
        ]);
        let mut published: Vec<String> = Vec::new();
        let text = consume_stream(stream, &mut |s| published.push(s.to_string()))
            .await
            .unwrap();

        assert_eq!(text, "<h1>Hello</h1><p>");
        assert_eq!(published.len(), 3);
        for pair in published.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
            assert!(pair[1].len() > pair[0].len());
        }
        assert_eq!(published.last().unwrap(), &text);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_text() {
        let mut calls = 0;
        let text = consume_stream(text_stream(vec![]), &mut |_| calls += 1)
            .await
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_surfaces_stream_read() {
        let items: Vec<Result<String>> = vec![
            Ok("partial".into()),
            Err(BlogflowError::Other("connection reset".into())),
            Ok("never".into()),
        ];
        let stream = stream::iter(items).boxed();
        let err = consume_stream(stream, &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, BlogflowError::StreamRead(ref m) if m == "connection reset"));
    }

    #[test]
    fn test_drain_lines_keeps_partial_tail() {
        let mut buf = b"first\nsec".to_vec();
        assert_eq!(drain_lines(&mut buf), vec!["first".to_string()]);
        assert_eq!(buf, b"sec".to_vec());
    }

    #[test]
    fn test_drain_lines_utf8_split() {
        // "→" is three bytes; split it across two reads.
        let arrow = "→".as_bytes();
        let mut buf = vec![arrow[0]];
        assert!(drain_lines(&mut buf).is_empty());
        buf.extend_from_slice(&arrow[1..]);
        buf.push(b'\n');
        assert_eq!(drain_lines(&mut buf), vec!["→".to_string()]);
    }

    struct Upper {
        buffer: Vec<u8>,
    }

    impl ChunkDecoder for Upper {
        fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
            self.buffer.extend_from_slice(chunk);
            Ok(drain_lines(&mut self.buffer)
                .into_iter()
                .map(|l| l.to_uppercase())
                .collect())
        }

        fn flush(&mut self) -> Result<Vec<String>> {
            let rest = String::from_utf8_lossy(&self.buffer).trim().to_uppercase();
            self.buffer.clear();
            Ok(if rest.is_empty() { vec![] } else { vec![rest] })
        }
    }

    #[tokio::test]
    async fn test_decode_byte_stream_flushes_tail() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Ok(b"ab\ncd".to_vec()), Ok(b"\nef".to_vec())];
        let stream = decode_byte_stream(stream::iter(chunks), Upper { buffer: Vec::new() });
        let text = consume_stream(stream, &mut |_| {}).await.unwrap();
        assert_eq!(text, "ABCDEF");
    }

    #[tokio::test]
    async fn test_decode_byte_stream_transport_error() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Ok(b"ab\n".to_vec()), Err("socket closed".into())];
        let stream = decode_byte_stream(stream::iter(chunks), Upper { buffer: Vec::new() });
        let err = consume_stream(stream, &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, BlogflowError::StreamRead(ref m) if m == "socket closed"));
    }
}
