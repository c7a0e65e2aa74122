//! Backend trait and the normalized provider request.
//!
//! The [`Backend`] trait abstracts over text-generation providers. A backend
//! only has to *open* a stream: it either returns a live [`TextStream`] or
//! fails before the first byte, which is what model fallback keys on.
//!
//! ```text
//! FallbackInvoker ──► LlmRequest ──► Backend::open_stream() ──► TextStream
//!                                          │
//!                        ┌─────────────────┼─────────────────┐
//!                  GeminiBackend      RelayBackend       MockBackend
//!              :streamGenerateContent   0:"…" lines      scripted outcomes
//!                     SSE
//! ```

pub mod backoff;
pub mod gemini;
pub mod mock;
pub mod relay;
pub mod sse;

pub use backoff::BackoffConfig;
pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockOutcome};
pub use relay::RelayBackend;

use crate::config::LlmConfig;
use crate::error::{BlogflowError, Result};
use crate::streaming::TextStream;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked before each same-candidate retry.
///
/// Arguments: `(attempt_number, delay_before_retry, reason_for_retry)`.
pub type RetryCallback<'a> = Option<&'a mut (dyn FnMut(u32, Duration, &str) + Send)>;

/// A normalized generation request for one model candidate.
#[derive(Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"gemini-1.5-flash"`).
    pub model: String,

    /// System instruction for the model.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Provider credential (API key).
    pub credential: String,

    /// Generation parameters.
    pub config: LlmConfig,
}

impl std::fmt::Debug for LlmRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmRequest")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("prompt", &self.prompt)
            .field("credential", &mask_credential(&self.credential))
            .field("config", &self.config)
            .finish()
    }
}

/// Show only a short prefix of a credential.
pub(crate) fn mask_credential(key: &str) -> String {
    match key.get(..6) {
        Some(prefix) if key.len() > 6 => format!("{}***", prefix),
        _ => "***".to_string(),
    }
}

/// Abstraction over streaming text-generation providers.
///
/// `open_stream` must resolve only once the provider has accepted the
/// request; failures it returns are treated as "before first byte" and
/// trigger fallback. Errors after that point travel inside the stream.
///
/// Object-safe; used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open a streaming generation call.
    async fn open_stream(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<TextStream>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Whether a failure is worth retrying on the same candidate.
///
/// Retryable: [`BlogflowError::HttpError`] with a status in
/// `config.retryable_statuses`, and connection-level [`BlogflowError::Request`].
pub fn is_retryable(error: &BlogflowError, config: &BackoffConfig) -> bool {
    match error {
        BlogflowError::HttpError { status, .. } => config.retryable_statuses.contains(status),
        BlogflowError::Request(_) => true,
        _ => false,
    }
}

/// Open a stream on one candidate, retrying transient failures per `config`.
///
/// Returns the first stream that opens, or the last error once retries are
/// used up or a non-retryable error occurs.
pub async fn with_backoff(
    backend: &Arc<dyn Backend>,
    client: &Client,
    base_url: &str,
    request: &LlmRequest,
    config: &BackoffConfig,
    mut on_retry: RetryCallback<'_>,
) -> Result<TextStream> {
    let mut attempt = 0;
    loop {
        match backend.open_stream(client, base_url, request).await {
            Ok(stream) => return Ok(stream),
            Err(e) if attempt < config.max_retries && is_retryable(&e, config) => {
                let retry_after = match &e {
                    BlogflowError::HttpError { retry_after, .. } => *retry_after,
                    _ => None,
                };
                let delay = config.delay_after(attempt, retry_after);
                attempt += 1;
                if let Some(ref mut cb) = on_retry {
                    cb(attempt, delay, &e.to_string());
                }
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Turn a non-success provider response into [`BlogflowError::HttpError`].
///
/// The body is reduced to the provider's own message when it has one; an
/// empty body falls back to the status reason.
pub(crate) async fn status_error(resp: reqwest::Response) -> BlogflowError {
    let status = resp.status();
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let text = resp.text().await.unwrap_or_default();
    let body = if text.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        gemini::provider_error_message(&text)
    };
    BlogflowError::HttpError {
        status: status.as_u16(),
        body,
        retry_after,
    }
}

/// Parse a `Retry-After` header value as whole seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
