//! # blogflow
//!
//! The generation engine behind a blog-authoring assistant: streamed draft
//! writing and social-media repurposing on top of Google Gemini, with model
//! fallback and an offline demo mode.
//!
//! ## Core Concepts
//!
//! - **[`ExecCtx`]**: shared context (HTTP client, base URL, backend,
//!   candidate list, retry policy, demo pacing, optional event handler).
//! - **[`Settings`]**: request-scoped values, chiefly the credential. An
//!   absent or blank credential selects demo mode.
//! - **[`DraftPipeline`]**: prompt in, streamed HTML out.
//! - **[`SocialPipeline`]**: blog HTML in, [`SocialPost`]s out, with the raw
//!   response text streamed for progress.
//! - **[`invoker::invoke`]**: tries [`ModelCandidates`] in order until one
//!   opens a stream.
//! - **[`Backend`]**: provider abstraction. [`GeminiBackend`] talks to the
//!   provider directly, [`RelayBackend`] to an intermediate hop speaking the
//!   `0:"…"` line framing, [`MockBackend`] to nothing at all.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use blogflow::{Config, DraftPipeline, Settings, SocialPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let ctx = Arc::new(config.into_ctx_builder()?.build());
//!     let settings = Settings::default().with_credential("AIza...");
//!
//!     let drafts = DraftPipeline::new(ctx.clone());
//!     let draft = drafts
//!         .generate(&settings, "Write about AI agents", &mut |so_far| {
//!             eprint!("\r{} chars", so_far.len());
//!         })
//!         .await?;
//!
//!     let social = SocialPipeline::new(ctx);
//!     let out = social.repurpose(&settings, &draft.text, &mut |_| {}).await?;
//!     for post in &out.posts {
//!         println!("{:?}: {}", post.platform, post.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod export;
pub mod extract;
pub mod framing;
pub mod invoker;
pub mod pipeline;
pub mod prompt;
pub mod social;
pub mod storage;
pub mod streaming;

pub use backend::{
    Backend, BackoffConfig, GeminiBackend, LlmRequest, MockBackend, MockOutcome, RelayBackend,
};
pub use config::{Config, LlmConfig};
pub use demo::DemoConfig;
pub use error::{BlogflowError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use export::ExportFormat;
pub use extract::ParseError;
pub use invoker::{Invocation, ModelCandidates};
pub use pipeline::{
    DraftOutput, DraftPipeline, GenerationRequest, Mode, Settings, SocialOutput, SocialPipeline,
};
pub use social::{Platform, PostType, SocialPost};
pub use storage::{CredentialStore, DraftStore, JsonFileStore, KeyValueStore, MemoryStore};
pub use streaming::{consume_stream, TextStream};
