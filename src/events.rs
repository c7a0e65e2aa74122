//! Lifecycle events for generation requests.
//!
//! An optional, non-intrusive way to observe the pipelines: which
//! candidates were tried, which stream opened, every fragment received,
//! and how the request ended. Implement [`EventHandler`] to feed a status
//! bar, progress display, or audit log.

use std::sync::Arc;

/// Events emitted while a generation request runs.
#[derive(Debug, Clone)]
pub enum Event {
    /// A pipeline accepted a request.
    GenerationStart {
        /// `"draft"` or `"social"`.
        pipeline: String,
        /// Whether the request runs in demo mode.
        demo: bool,
    },
    /// A model candidate is about to be tried.
    CandidateAttempt { pipeline: String, model: String },
    /// A model candidate failed before its stream opened.
    CandidateFailed {
        pipeline: String,
        model: String,
        /// The underlying failure message.
        reason: String,
    },
    /// A candidate opened its stream; no later candidate will be tried.
    StreamOpened { pipeline: String, model: String },
    /// A text fragment was appended to the accumulated output.
    Chunk { pipeline: String, chunk: String },
    /// Social posts were extracted from the finished stream.
    PostsExtracted {
        /// Number of posts parsed; zero when extraction degraded.
        count: usize,
    },
    /// The request finished.
    GenerationEnd { pipeline: String, ok: bool },
}

/// Handler for generation events.
///
/// Entirely optional; pipelines work without one.
///
/// # Example
///
/// ```
/// use blogflow::events::{Event, EventHandler};
///
/// struct StatusLine;
///
/// impl EventHandler for StatusLine {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::CandidateFailed { model, reason, .. } => eprintln!("{model}: {reason}"),
///             Event::GenerationEnd { ok, .. } => eprintln!("done ok={ok}"),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called for every emitted event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
