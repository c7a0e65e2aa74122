//! Execution context shared by the pipelines.
//!
//! [`ExecCtx`] holds everything that stays fixed across requests: the HTTP
//! client, where to send requests and through which backend, the default
//! candidate order, and demo pacing. The credential is per request and
//! travels in [`Settings`](crate::pipeline::Settings) instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::backend::gemini::GEMINI_BASE_URL;
use crate::backend::{Backend, BackoffConfig, GeminiBackend, RelayBackend};
use crate::config::LlmConfig;
use crate::demo::DemoConfig;
use crate::events::EventHandler;
use crate::invoker::ModelCandidates;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared context for generation requests.
///
/// # Example
///
/// ```
/// use blogflow::ExecCtx;
///
/// let ctx = ExecCtx::gemini().build();
/// assert_eq!(ctx.backend.name(), "gemini");
/// assert_eq!(ctx.candidates.len(), 3);
/// ```
pub struct ExecCtx {
    pub client: Client,
    /// Provider or relay origin, without an API-version path.
    pub base_url: String,
    pub backend: Arc<dyn Backend>,
    pub backoff: BackoffConfig,
    /// Fallback order used unless a request overrides it.
    pub candidates: ModelCandidates,
    pub generation: LlmConfig,
    pub demo: DemoConfig,
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Start a builder for requests sent to `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            base_url: base_url.into(),
            client: None,
            timeout: DEFAULT_TIMEOUT,
            backend: Arc::new(GeminiBackend::new()),
            backoff: BackoffConfig::none(),
            candidates: ModelCandidates::default(),
            generation: LlmConfig::default(),
            demo: DemoConfig::default(),
            event_handler: None,
        }
    }

    /// Talk to Gemini directly.
    pub fn gemini() -> ExecCtxBuilder {
        Self::builder(GEMINI_BASE_URL)
    }

    /// Talk to a framing relay at `origin`, posting to `/api/generate`.
    pub fn relay(origin: impl Into<String>) -> ExecCtxBuilder {
        Self::builder(origin).backend(Arc::new(RelayBackend::default()))
    }
}

impl fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("candidates", &self.candidates)
            .field("backoff", &self.backoff)
            .field("generation", &self.generation)
            .field("demo", &self.demo)
            .field("observed", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`]; every setting has a default.
pub struct ExecCtxBuilder {
    base_url: String,
    client: Option<Client>,
    timeout: Duration,
    backend: Arc<dyn Backend>,
    backoff: BackoffConfig,
    candidates: ModelCandidates,
    generation: LlmConfig,
    demo: DemoConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtxBuilder {
    /// Use this client as-is; [`timeout`](Self::timeout) is then ignored.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Request timeout for the built-in client. Default: 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn candidates(mut self, candidates: ModelCandidates) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn generation(mut self, generation: LlmConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn demo(mut self, demo: DemoConfig) -> Self {
        self.demo = demo;
        self
    }

    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn build(self) -> ExecCtx {
        let timeout = self.timeout;
        let client = self.client.unwrap_or_else(|| {
            Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not configure HTTP client, using defaults");
                Client::new()
            })
        });

        ExecCtx {
            client,
            base_url: strip_api_version(&self.base_url),
            backend: self.backend,
            backoff: self.backoff,
            candidates: self.candidates,
            generation: self.generation,
            demo: self.demo,
            event_handler: self.event_handler,
        }
    }
}

/// Drop a trailing slash and any API-version path; backends add their own.
fn strip_api_version(url: &str) -> String {
    const VERSION_PATHS: [&str; 4] = ["/v1beta/models", "/v1/models", "/v1beta", "/v1"];

    let url = url.trim_end_matches('/');
    VERSION_PATHS
        .iter()
        .find_map(|suffix| url.strip_suffix(suffix))
        .unwrap_or(url)
        .to_string()
}
