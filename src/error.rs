use std::time::Duration;
use thiserror::Error;

/// Errors produced by the generation pipelines and their collaborators.
#[derive(Error, Debug)]
pub enum BlogflowError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization or parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A live request was issued without a provider credential.
    #[error("API key is required")]
    MissingCredential,

    /// The prompt (or blog content) was empty.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// The blog content is too short to be repurposed.
    #[error("content too short to repurpose: {actual} chars (need at least {min})")]
    ContentTooShort { min: usize, actual: usize },

    /// A single model candidate failed before its stream was established.
    #[error("model '{model}' unavailable: {message}")]
    ModelUnavailable { model: String, message: String },

    /// Every model candidate failed; `message` is the last candidate's failure.
    #[error("generation failed: {message}")]
    AllCandidatesExhausted { message: String },

    /// The stream failed after bytes had started flowing.
    #[error("stream read failed: {0}")]
    StreamRead(String),

    /// HTTP error with status code, response body, and optional Retry-After hint.
    ///
    /// Returned by [`Backend`](crate::backend::Backend) implementations when
    /// the provider rejects the request before any stream is opened.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 400, 429, 503).
        status: u16,
        /// Response body text, or the extracted provider error message.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// A generation is already in flight on this pipeline instance.
    #[error("a generation is already in progress")]
    Busy,

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The injected key-value store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl BlogflowError {
    /// The underlying failure message without the variant's prefix.
    ///
    /// Used by the fallback invoker so the terminal error carries the
    /// provider's own wording rather than a nested chain of prefixes.
    pub fn message(&self) -> String {
        match self {
            BlogflowError::HttpError { body, .. } => body.clone(),
            BlogflowError::ModelUnavailable { message, .. } => message.clone(),
            BlogflowError::AllCandidatesExhausted { message } => message.clone(),
            BlogflowError::StreamRead(msg)
            | BlogflowError::Storage(msg)
            | BlogflowError::InvalidConfig(msg)
            | BlogflowError::Other(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for BlogflowError {
    fn from(err: anyhow::Error) -> Self {
        BlogflowError::Other(err.to_string())
    }
}

impl From<std::io::Error> for BlogflowError {
    fn from(err: std::io::Error) -> Self {
        BlogflowError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlogflowError>;
