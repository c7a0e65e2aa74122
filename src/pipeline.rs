//! Draft generation and social repurposing pipelines.
//!
//! Each pipeline validates its input, picks demo or live mode from the
//! request-scoped [`Settings`], and streams the result through an observer
//! that always receives the complete text so far.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use blogflow::{DemoConfig, DraftPipeline, ExecCtx, Settings};
//! use blogflow::demo::DEMO_BLOG_POST;
//!
//! # tokio_test::block_on(async {
//! let ctx = Arc::new(ExecCtx::gemini().demo(DemoConfig::instant()).build());
//! let drafts = DraftPipeline::new(ctx);
//!
//! let out = drafts
//!     .generate(&Settings::default(), "Write about agents", &mut |_| {})
//!     .await
//!     .unwrap();
//! assert!(out.demo);
//! assert_eq!(out.text, DEMO_BLOG_POST);
//! # });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::demo;
use crate::error::{BlogflowError, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::invoker::{invoke, InvokeRequest, ModelCandidates};
use crate::prompt::{social_prompt, DRAFT_SYSTEM_PROMPT, SOCIAL_SYSTEM_PROMPT};
use crate::social::{extract_social_posts, posts_to_json, SocialPost};
use crate::streaming::consume_stream;

/// Shortest blog post accepted for repurposing, in characters.
pub const MIN_SOCIAL_CONTENT_CHARS: usize = 50;

/// Observer for the growing response text.
pub type OnUpdate<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Values that belong to one request rather than to the shared context.
#[derive(Clone)]
pub struct Settings {
    /// Provider credential. Absent or blank selects demo mode.
    pub credential: Option<String>,
    /// Overrides the context's candidate list for this request.
    pub models: Option<ModelCandidates>,
    /// When false, a missing credential is an error instead of demo mode.
    pub demo_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential: None,
            models: None,
            demo_fallback: true,
        }
    }
}

impl Settings {
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_models(mut self, models: ModelCandidates) -> Self {
        self.models = Some(models);
        self
    }

    /// Require a credential; never fall back to demo mode.
    pub fn live_only(mut self) -> Self {
        self.demo_fallback = false;
        self
    }

    /// The credential, if present and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field(
                "credential",
                &self.credential().map(crate::backend::mask_credential),
            )
            .field("models", &self.models)
            .field("demo_fallback", &self.demo_fallback)
            .finish()
    }
}

/// Which pipeline a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Draft,
    Social,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Draft => "draft",
            Mode::Social => "social",
        }
    }
}

/// One validated unit of work for a pipeline.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: Mode,
    /// The user prompt, or the blog content to repurpose.
    pub instruction_prompt: String,
    /// `None` means demo mode.
    pub credential: Option<String>,
}

impl GenerationRequest {
    /// Build and validate a request.
    ///
    /// Fails with [`BlogflowError::EmptyPrompt`] for a blank prompt, with
    /// [`BlogflowError::ContentTooShort`] for social content under
    /// [`MIN_SOCIAL_CONTENT_CHARS`], and with
    /// [`BlogflowError::MissingCredential`] when the settings forbid demo
    /// mode and carry no credential.
    pub fn new(mode: Mode, prompt: &str, settings: &Settings) -> Result<Self> {
        if prompt.trim().is_empty() {
            return Err(BlogflowError::EmptyPrompt);
        }
        if mode == Mode::Social {
            let actual = prompt.chars().count();
            if actual < MIN_SOCIAL_CONTENT_CHARS {
                return Err(BlogflowError::ContentTooShort {
                    min: MIN_SOCIAL_CONTENT_CHARS,
                    actual,
                });
            }
        }
        let credential = settings.credential().map(str::to_string);
        if credential.is_none() && !settings.demo_fallback {
            return Err(BlogflowError::MissingCredential);
        }
        Ok(Self {
            mode,
            instruction_prompt: prompt.to_string(),
            credential,
        })
    }

    pub fn is_demo(&self) -> bool {
        self.credential.is_none()
    }
}

/// A finished draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutput {
    pub text: String,
    /// The candidate that served the request; `None` in demo mode.
    pub model: Option<String>,
    pub demo: bool,
}

/// Finished social posts plus the raw response they were carved from.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialOutput {
    /// Empty when the response held no usable JSON array.
    pub posts: Vec<SocialPost>,
    pub raw_text: String,
    pub model: Option<String>,
    pub demo: bool,
}

/// Marks a pipeline busy until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BlogflowError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Free-text prompt to streamed HTML.
#[derive(Debug)]
pub struct DraftPipeline {
    ctx: Arc<ExecCtx>,
    in_flight: AtomicBool,
}

impl DraftPipeline {
    pub fn new(ctx: Arc<ExecCtx>) -> Self {
        Self {
            ctx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Generate a draft, publishing the accumulated HTML after every chunk.
    ///
    /// A second call while one is running fails with
    /// [`BlogflowError::Busy`].
    pub async fn generate(
        &self,
        settings: &Settings,
        prompt: &str,
        on_update: OnUpdate<'_>,
    ) -> Result<DraftOutput> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let request = GenerationRequest::new(Mode::Draft, prompt, settings)?;
        start(&self.ctx, &request);

        let result = match request.credential.as_deref() {
            None => {
                debug!("draft pipeline running in demo mode");
                let stream = demo::draft_stream(&self.ctx.demo);
                observe(&self.ctx, Mode::Draft, stream, on_update)
                    .await
                    .map(|text| DraftOutput {
                        text,
                        model: None,
                        demo: true,
                    })
            }
            Some(credential) => live(
                &self.ctx,
                settings,
                Mode::Draft,
                DRAFT_SYSTEM_PROMPT,
                &request.instruction_prompt,
                credential,
                on_update,
            )
            .await
            .map(|(text, model)| DraftOutput {
                text,
                model: Some(model),
                demo: false,
            }),
        };

        finish(&self.ctx, Mode::Draft, &result);
        result
    }
}

/// Blog HTML to a set of platform-specific posts.
#[derive(Debug)]
pub struct SocialPipeline {
    ctx: Arc<ExecCtx>,
    in_flight: AtomicBool,
}

impl SocialPipeline {
    pub fn new(ctx: Arc<ExecCtx>) -> Self {
        Self {
            ctx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Repurpose `blog_content` into social posts.
    ///
    /// The observer sees the raw response text as it grows. Once the stream
    /// ends the posts are carved out of it; an unusable response yields an
    /// empty post list rather than an error.
    pub async fn repurpose(
        &self,
        settings: &Settings,
        blog_content: &str,
        on_update: OnUpdate<'_>,
    ) -> Result<SocialOutput> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let request = GenerationRequest::new(Mode::Social, blog_content, settings)?;
        start(&self.ctx, &request);

        let result = match request.credential.as_deref() {
            None => {
                let posts = demo::social_posts(&self.ctx.demo).await;
                posts_to_json(&posts)
                    .map_err(BlogflowError::from)
                    .map(|raw_text| SocialOutput {
                        posts,
                        raw_text,
                        model: None,
                        demo: true,
                    })
            }
            Some(credential) => {
                let prompt = social_prompt(&request.instruction_prompt);
                live(
                    &self.ctx,
                    settings,
                    Mode::Social,
                    SOCIAL_SYSTEM_PROMPT,
                    &prompt,
                    credential,
                    on_update,
                )
                .await
                .map(|(raw_text, model)| SocialOutput {
                    posts: extract_social_posts(&raw_text),
                    raw_text,
                    model: Some(model),
                    demo: false,
                })
            }
        };

        if let Ok(out) = &result {
            info!(count = out.posts.len(), demo = out.demo, "social posts ready");
            emit(
                &self.ctx.event_handler,
                Event::PostsExtracted {
                    count: out.posts.len(),
                },
            );
        }
        finish(&self.ctx, Mode::Social, &result);
        result
    }
}

fn start(ctx: &ExecCtx, request: &GenerationRequest) {
    info!(
        pipeline = request.mode.as_str(),
        demo = request.is_demo(),
        prompt_chars = request.instruction_prompt.chars().count(),
        "generation started"
    );
    emit(
        &ctx.event_handler,
        Event::GenerationStart {
            pipeline: request.mode.as_str().to_string(),
            demo: request.is_demo(),
        },
    );
}

fn finish<T>(ctx: &ExecCtx, mode: Mode, result: &Result<T>) {
    emit(
        &ctx.event_handler,
        Event::GenerationEnd {
            pipeline: mode.as_str().to_string(),
            ok: result.is_ok(),
        },
    );
}

async fn live(
    ctx: &ExecCtx,
    settings: &Settings,
    mode: Mode,
    system_prompt: &str,
    prompt: &str,
    credential: &str,
    on_update: OnUpdate<'_>,
) -> Result<(String, String)> {
    let candidates = settings.models.as_ref().unwrap_or(&ctx.candidates);
    let invocation = invoke(
        ctx,
        candidates,
        &InvokeRequest {
            pipeline: mode.as_str(),
            system_prompt,
            prompt,
            credential,
            config: &ctx.generation,
        },
    )
    .await?;

    let text = observe(ctx, mode, invocation.stream, on_update).await?;
    Ok((text, invocation.model))
}

/// Consume `stream`, forwarding each fragment as a [`Event::Chunk`].
async fn observe(
    ctx: &ExecCtx,
    mode: Mode,
    stream: crate::streaming::TextStream,
    on_update: OnUpdate<'_>,
) -> Result<String> {
    let handler = &ctx.event_handler;
    let mut published = 0;
    let mut forward = |text: &str| {
        emit(
            handler,
            Event::Chunk {
                pipeline: mode.as_str().to_string(),
                chunk: text[published..].to_string(),
            },
        );
        published = text.len();
        on_update(text);
    };
    consume_stream(stream, &mut forward).await
}
