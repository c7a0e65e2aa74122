//! System instructions and prompt templates for both pipelines.

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// System instruction for draft generation.
pub const DRAFT_SYSTEM_PROMPT: &str = "You are an expert blog post writer. Write clean, formatted HTML content suitable for a rich text editor. Use <h1>, <h2>, <p>, <ul>, <li>, <strong>, <em> tags where appropriate. Do not wrap the content in markdown code blocks or ```html. Just return the raw HTML content.";

/// System instruction for social repurposing.
pub const SOCIAL_SYSTEM_PROMPT: &str = "You are a social media expert. Return ONLY valid JSON array.";

/// Strategist prompt; `{input}` receives the blog post.
pub const SOCIAL_PROMPT_TEMPLATE: &str = r##"You are a world-class social media strategist. Take the following long-form blog post and break it into 8–15 bite-sized posts optimized for LinkedIn, Twitter/X, and Instagram/Facebook (threads/carousels).

For each post return JSON with this structure:
[
  {{
    "platform": "Twitter" | "LinkedIn" | "Instagram",
    "type": "single" | "thread_start" | "thread_middle" | "thread_end" | "carousel_slide",
    "text": "the post copy (keep under platform character limits)",
    "suggested_hashtags": ["#example1", "#example2"],
    "emoji_strategy": "where to place emojis for maximum engagement",
    "call_to_action": "e.g. Save this, reply with your thoughts, etc."
  }},
  ...
]

Prioritize hook → value → CTA in every single post. Make them feel native to each platform. Use curiosity gaps, numbers, and emotional triggers.

Blog Post Content:
{input}"##;

/// Substitute `{input}` in `template`.
///
/// Use `{{` for a literal `{` and `}}` for a literal `}`. Braces inside
/// `input` are never interpreted.
///
/// # Example
///
/// ```
/// use blogflow::prompt::render;
///
/// let out = render("Post: {input} as {{\"json\": true}}", "<p>{x}</p>");
/// assert_eq!(out, r#"Post: <p>{x}</p> as {"json": true}"#);
/// ```
pub fn render(template: &str, input: &str) -> String {
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    // Split on the placeholder so the input is inserted last and untouched.
    let pieces: Vec<String> = rendered
        .split("{input}")
        .map(|p| {
            p.replace(ESCAPE_SENTINEL, "{")
                .replace(ESCAPE_SENTINEL_CLOSE, "}")
        })
        .collect();
    pieces.join(input)
}

/// The full social-repurposing prompt for a blog post.
pub fn social_prompt(blog_content: &str) -> String {
    render(SOCIAL_PROMPT_TEMPLATE, blog_content)
}
