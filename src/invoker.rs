//! Model-fallback invoker.
//!
//! Tries each model candidate in order until one opens a stream. Attempts
//! are strictly sequential and at most one stream is opened per
//! invocation. Fallback only covers failures before the first byte; once a
//! stream is returned, errors inside it belong to the consumer.

use std::fmt;

use tracing::{error, info, warn};

use crate::backend::{self, LlmRequest};
use crate::config::LlmConfig;
use crate::error::{BlogflowError, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::streaming::TextStream;

/// Ordered, non-empty list of model identifiers. Order is fallback precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates(Vec<String>);

impl ModelCandidates {
    /// Build a candidate list; fails on an empty list or a blank identifier.
    pub fn new<I, S>(models: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models.into_iter().map(Into::into).collect();
        if models.is_empty() {
            return Err(BlogflowError::InvalidConfig(
                "model candidate list must not be empty".into(),
            ));
        }
        if models.iter().any(|m| m.trim().is_empty()) {
            return Err(BlogflowError::InvalidConfig(
                "model identifiers must not be blank".into(),
            ));
        }
        Ok(Self(models))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ModelCandidates {
    /// Fastest tier first, then the larger model, then the legacy one.
    fn default() -> Self {
        Self(vec![
            "gemini-1.5-flash".to_string(),
            "gemini-1.5-pro".to_string(),
            "gemini-1.0-pro".to_string(),
        ])
    }
}

/// A stream opened by one candidate.
pub struct Invocation {
    /// The model that opened the stream.
    pub model: String,
    /// The live text stream.
    pub stream: TextStream,
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Fallback progress. Each transition depends only on the last attempt.
enum FallbackState {
    Trying(usize),
    Success(Invocation),
    Exhausted(BlogflowError),
}

/// What to send to each candidate.
#[derive(Debug, Clone)]
pub struct InvokeRequest<'a> {
    /// Pipeline name for events and logs (`"draft"`, `"social"`).
    pub pipeline: &'a str,
    pub system_prompt: &'a str,
    pub prompt: &'a str,
    /// Must be non-empty; the caller rejects missing credentials first.
    pub credential: &'a str,
    pub config: &'a LlmConfig,
}

/// Open a stream on the first candidate that accepts the request.
///
/// On total failure returns [`BlogflowError::AllCandidatesExhausted`]
/// carrying the last candidate's failure message.
pub async fn invoke(
    ctx: &ExecCtx,
    candidates: &ModelCandidates,
    req: &InvokeRequest<'_>,
) -> Result<Invocation> {
    let models = candidates.as_slice();
    let mut state = FallbackState::Trying(0);

    loop {
        state = match state {
            FallbackState::Trying(index) => {
                let model = &models[index];
                info!(
                    pipeline = req.pipeline,
                    model = %model,
                    backend = ctx.backend.name(),
                    "attempting generation"
                );
                emit(
                    &ctx.event_handler,
                    Event::CandidateAttempt {
                        pipeline: req.pipeline.to_string(),
                        model: model.clone(),
                    },
                );

                let request = LlmRequest {
                    model: model.clone(),
                    system_prompt: Some(req.system_prompt.to_string()),
                    prompt: req.prompt.to_string(),
                    credential: req.credential.to_string(),
                    config: req.config.clone(),
                };
                let mut on_retry = |attempt: u32, delay: std::time::Duration, reason: &str| {
                    warn!(model = %model, attempt, delay_ms = delay.as_millis() as u64, reason, "retrying candidate");
                };

                match backend::with_backoff(
                    &ctx.backend,
                    &ctx.client,
                    &ctx.base_url,
                    &request,
                    &ctx.backoff,
                    Some(&mut on_retry),
                )
                .await
                {
                    Ok(stream) => FallbackState::Success(Invocation {
                        model: model.clone(),
                        stream,
                    }),
                    Err(e) => {
                        warn!(model = %model, error = %e, "candidate failed");
                        emit(
                            &ctx.event_handler,
                            Event::CandidateFailed {
                                pipeline: req.pipeline.to_string(),
                                model: model.clone(),
                                reason: e.message(),
                            },
                        );
                        if index + 1 < models.len() {
                            FallbackState::Trying(index + 1)
                        } else {
                            FallbackState::Exhausted(e)
                        }
                    }
                }
            }
            FallbackState::Success(invocation) => {
                info!(pipeline = req.pipeline, model = %invocation.model, "stream opened");
                emit(
                    &ctx.event_handler,
                    Event::StreamOpened {
                        pipeline: req.pipeline.to_string(),
                        model: invocation.model.clone(),
                    },
                );
                return Ok(invocation);
            }
            FallbackState::Exhausted(last) => {
                error!(pipeline = req.pipeline, error = %last, "all model fallbacks failed");
                return Err(BlogflowError::AllCandidatesExhausted {
                    message: last.message(),
                });
            }
        };
    }
}
