//! Draft export as HTML or Markdown.

use std::sync::OnceLock;

use regex::Regex;

/// Output format for a draft download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Markdown,
}

impl ExportFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Html => "blog-post.html",
            ExportFormat::Markdown => "blog-post.md",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::Markdown => "text/markdown",
        }
    }
}

/// Render `draft` in `format`; `None` for an empty draft.
pub fn export(draft: &str, format: ExportFormat) -> Option<String> {
    if draft.is_empty() {
        return None;
    }
    Some(match format {
        ExportFormat::Html => draft.to_string(),
        ExportFormat::Markdown => to_markdown(draft),
    })
}

// Applied in order; each rule sees the previous rule's output. Matching
// is per line, so elements spanning lines fall through to tag stripping.
const MARKDOWN_RULES: &[(&str, &str)] = &[
    (r"<h1>(.*?)</h1>", "# ${1}\n\n"),
    (r"<h2>(.*?)</h2>", "## ${1}\n\n"),
    (r"<p>(.*?)</p>", "${1}\n\n"),
    (r"<strong>(.*?)</strong>", "**${1}**"),
    (r"<em>(.*?)</em>", "*${1}*"),
    (r"<ul>", ""),
    (r"</ul>", ""),
    (r"<li>(.*?)</li>", "- ${1}\n"),
    (r"<[^>]*>", ""),
];

fn markdown_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        MARKDOWN_RULES
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|re| (re, *replacement))
            })
            .collect()
    })
}

/// Approximate Markdown for the HTML the editor produces.
///
/// This is a tag-level rewrite, not an HTML parser: nested or multi-line
/// elements lose their formatting but keep their text.
///
/// ```
/// use blogflow::export::to_markdown;
///
/// assert_eq!(
///     to_markdown("<h1>Title</h1><p>Some <strong>bold</strong> text</p>"),
///     "# Title\n\nSome **bold** text\n\n"
/// );
/// ```
pub fn to_markdown(html: &str) -> String {
    markdown_rules()
        .iter()
        .fold(html.to_string(), |text, (re, replacement)| {
            re.replace_all(&text, *replacement).into_owned()
        })
}
