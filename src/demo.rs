//! Offline simulation of both pipelines.
//!
//! With no credential configured, the draft pipeline replays a fixed HTML
//! document in small timed chunks and the social pipeline returns a fixed
//! set of posts after a pause. Pacing never changes the output.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BlogflowError;
use crate::social::{extract_social_posts, SocialPost};
use crate::streaming::TextStream;

/// Pacing for demo replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Characters per replayed chunk.
    pub chunk_len: usize,
    /// Delay before each chunk.
    pub chunk_delay_ms: u64,
    /// Delay before the social posts are returned.
    pub social_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            chunk_len: 10,
            chunk_delay_ms: 30,
            social_delay_ms: 2000,
        }
    }
}

impl DemoConfig {
    /// No delays; same output.
    pub fn instant() -> Self {
        Self {
            chunk_delay_ms: 0,
            social_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn social_delay(&self) -> Duration {
        Duration::from_millis(self.social_delay_ms)
    }
}

/// The document replayed by the demo draft pipeline.
pub const DEMO_BLOG_POST: &str = r#"
<h1>The Future of Coding: How AI Agents Are Transforming Software Development</h1>

<p>The landscape of software development is undergoing a seismic shift. We are moving beyond simple code completion tools to a new era of <strong>AI Agents</strong>—autonomous systems capable of planning, executing, and verifying complex coding tasks.</p>

<h2>Beyond Autocomplete</h2>
<p>Traditional AI coding assistants were like smart typewriters. They could suggest the next line of code, but they lacked context. AI Agents, however, act more like <em>junior developers</em>. They can:</p>
<ul>
    <li>Understand the entire project structure</li>
    <li>Plan multi-step refactors</li>
    <li>Run terminal commands and fix bugs</li>
    <li>Verify their own work</li>
</ul>

<h2>The Agentic Workflow</h2>
<p>The true power of these agents lies in their ability to work in loops. Instead of a single "prompt-response" cycle, an agent enters a loop of <strong>Thought → Action → Observation</strong>. It tries a solution, sees if it works, and if not, it tries again. This resilience is what makes them so powerful.</p>

<h2>What This Means for Developers</h2>
<p>Does this mean the end of human programmers? <strong>Absolutely not.</strong> It means a shift in abstraction. Developers will spend less time on syntax and boilerplate, and more time on:</p>
<ul>
    <li>System Architecture</li>
    <li>Business Logic</li>
    <li>User Experience</li>
    <li>Reviewing and Orchestrating Agents</li>
</ul>

<p>The future isn't just about writing code; it's about designing the systems that write code.</p>
"#;

const DEMO_SOCIAL_JSON: &str = r##"[
    {
        "platform": "Twitter",
        "type": "thread_start",
        "text": "1/5 🚨 Coding is changing forever. \n\nWe're moving from \"autocomplete\" to \"autonomous agents\". \n\nHere's why AI Agents are the biggest shift in software dev since the compiler: 🧵👇",
        "suggested_hashtags": ["#AI", "#Coding", "#TechTrends"],
        "emoji_strategy": "Use alert and thread emojis to stop the scroll",
        "call_to_action": "Read the thread"
    },
    {
        "platform": "Twitter",
        "type": "thread_middle",
        "text": "2/5 Traditional AI tools just predict the next token. \n\nAI Agents have a loop: \nThought ➡️ Action ➡️ Observation.\n\nThey don't just write code; they run it, test it, and fix it if it breaks. 🤯",
        "suggested_hashtags": ["#AgenticAI", "#DevLife"],
        "emoji_strategy": "Mind blown emoji for the core concept",
        "call_to_action": "None"
    },
    {
        "platform": "Twitter",
        "type": "thread_middle",
        "text": "3/5 Think of them as \"Junior Developers\" on demand. \n\nYou give them a high-level goal (\"Refactor this component\"), and they handle the file edits, terminal commands, and verification.",
        "suggested_hashtags": ["#Productivity", "#SoftwareEngineering"],
        "emoji_strategy": "👨‍💻 emoji to humanize the agent",
        "call_to_action": "None"
    },
    {
        "platform": "Twitter",
        "type": "thread_end",
        "text": "4/5 The future isn't about replacing devs. It's about abstraction. \n\nWe'll spend less time on boilerplate and more time on Architecture & UX. \n\nThe future is bright. ☀️",
        "suggested_hashtags": ["#FutureOfWork"],
        "emoji_strategy": "Sun emoji for optimism",
        "call_to_action": "Retweet if you agree!"
    },
    {
        "platform": "LinkedIn",
        "type": "single",
        "text": "The era of \"AI Autocomplete\" is ending. The era of \"AI Agents\" is beginning.\n\nI've been exploring how autonomous agents are reshaping software development, and the difference is profound.\n\nTraditional tools help you write lines of code faster. Agents help you build *features* faster.\n\nThey work in a loop of Planning, Executing, and Verifying. They can run terminal commands, debug their own errors, and understand the full context of a repository.\n\nThis doesn't mean the end of developers. It means we get to operate at a higher level of abstraction—focusing on architecture and user value rather than syntax.\n\nAre you using agents in your workflow yet?\n\n#AI #SoftwareDevelopment #TechTrends #Innovation",
        "suggested_hashtags": ["#AI", "#SoftwareDevelopment", "#TechTrends"],
        "emoji_strategy": "Professional but engaging",
        "call_to_action": "Comment below"
    }
]"##;

/// The five posts returned by the demo social pipeline.
pub fn demo_social_posts() -> Vec<SocialPost> {
    extract_social_posts(DEMO_SOCIAL_JSON)
}

/// Split `doc` into pieces of at most `len` characters.
///
/// Splits on character boundaries, so multi-byte characters stay whole.
/// A `len` of zero is treated as one.
pub fn chunk_document(doc: &str, len: usize) -> Vec<String> {
    let len = len.max(1);
    let mut chunks = Vec::with_capacity(doc.len() / len + 1);
    let mut current = String::new();
    let mut count = 0;
    for ch in doc.chars() {
        current.push(ch);
        count += 1;
        if count == len {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Replay [`DEMO_BLOG_POST`] as a paced [`TextStream`].
pub fn draft_stream(config: &DemoConfig) -> TextStream {
    let delay = config.chunk_delay();
    let chunks = chunk_document(DEMO_BLOG_POST, config.chunk_len);
    debug!(chunks = chunks.len(), delay_ms = config.chunk_delay_ms, "replaying demo draft");

    stream::iter(chunks)
        .then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, BlogflowError>(chunk)
        })
        .boxed()
}

/// The demo posts, after the configured pause.
pub async fn social_posts(config: &DemoConfig) -> Vec<SocialPost> {
    debug!(delay_ms = config.social_delay_ms, "returning demo social posts");
    let delay = config.social_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    demo_social_posts()
}
