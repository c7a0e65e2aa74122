//! Mock backend for testing without a live provider.
//!
//! [`MockBackend`] scripts an outcome per model identifier and records
//! which models were attempted, so fallback order can be asserted exactly.
//!
//! # Example
//!
//! ```
//! use blogflow::backend::{MockBackend, MockOutcome};
//!
//! let mock = MockBackend::new()
//!     .with_model("gemini-1.5-flash", MockOutcome::Fail("quota exceeded".into()))
//!     .with_model("gemini-1.5-pro", MockOutcome::Stream(vec!["<h1>Hi</h1>".into()]));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::Client;

use super::{Backend, LlmRequest};
use crate::error::{BlogflowError, Result};
use crate::streaming::{text_stream, TextStream};

/// What the mock does when a model is asked to open a stream.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Fail before the first byte with [`BlogflowError::ModelUnavailable`].
    Fail(String),
    /// Fail before the first byte with an HTTP status.
    Status(u16, String),
    /// Open a stream yielding these fragments.
    Stream(Vec<String>),
    /// Open a stream that yields `chunks`, then fails with `message`.
    FailMidStream { chunks: Vec<String>, message: String },
    /// One outcome per attempt on the same model; the last one repeats.
    Sequence(Vec<MockOutcome>),
}

/// A test backend with scripted per-model outcomes.
///
/// Models without a script fail with `"model not found"`, unless a
/// default outcome was set with [`MockBackend::fixed`] or
/// [`MockBackend::with_default`].
#[derive(Debug, Default)]
pub struct MockBackend {
    outcomes: HashMap<String, MockOutcome>,
    default: Option<MockOutcome>,
    calls: Mutex<Vec<LlmRequest>>,
    sequence_pos: Mutex<HashMap<String, usize>>,
    opened: AtomicUsize,
}

impl MockBackend {
    /// Create an empty mock; every model fails until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock where every model streams `response` as one fragment.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new().with_default(MockOutcome::Stream(vec![response.into()]))
    }

    /// Script the outcome for one model.
    pub fn with_model(mut self, model: impl Into<String>, outcome: MockOutcome) -> Self {
        self.outcomes.insert(model.into(), outcome);
        self
    }

    /// Outcome for models without a script.
    pub fn with_default(mut self, outcome: MockOutcome) -> Self {
        self.default = Some(outcome);
        self
    }

    /// Model identifiers in the order they were attempted.
    pub fn attempts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of streams successfully opened.
    pub fn streams_opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    fn resolve(&self, model: &str) -> MockOutcome {
        let scripted = self
            .outcomes
            .get(model)
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or_else(|| MockOutcome::Fail("model not found".into()));

        match scripted {
            MockOutcome::Sequence(steps) if !steps.is_empty() => {
                let mut positions = match self.sequence_pos.lock() {
                    Ok(p) => p,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let pos = positions.entry(model.to_string()).or_insert(0);
                let step = steps[(*pos).min(steps.len() - 1)].clone();
                *pos += 1;
                step
            }
            other => other,
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn open_stream(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<TextStream> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let stream = match self.resolve(&request.model) {
            MockOutcome::Fail(message) => {
                return Err(BlogflowError::ModelUnavailable {
                    model: request.model.clone(),
                    message,
                })
            }
            MockOutcome::Status(status, body) => {
                return Err(BlogflowError::HttpError {
                    status,
                    body,
                    retry_after: None,
                })
            }
            MockOutcome::Stream(chunks) => text_stream(chunks),
            MockOutcome::FailMidStream { chunks, message } => stream::iter(chunks.into_iter().map(Ok))
                .chain(stream::once(async move { Err(BlogflowError::StreamRead(message)) }))
                .boxed(),
            MockOutcome::Sequence(_) => text_stream(Vec::new()),
        };

        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(stream)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
