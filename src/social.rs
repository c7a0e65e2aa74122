//! Social posts carved out of a repurposing response.
//!
//! The whole set fails only when the response holds no JSON array of
//! objects; the result is then empty and the raw text is kept for display.
//! Individual posts are passed through as-is: a field that is missing,
//! `null` or of the wrong JSON type reads as its default, and a post with a
//! missing or unknown `platform` stays in the set but matches no platform
//! filter.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::extract::{parse_object_array, ParseError};

/// Target network of a post.
///
/// Unrecognized names are preserved verbatim in [`Platform::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Twitter,
    LinkedIn,
    Instagram,
    Other(String),
}

impl Platform {
    /// The three platforms a post can be filtered by, in display order.
    pub const KNOWN: [Platform; 3] = [Platform::Twitter, Platform::LinkedIn, Platform::Instagram];

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Twitter => "Twitter",
            Platform::LinkedIn => "LinkedIn",
            Platform::Instagram => "Instagram",
            Platform::Other(name) => name,
        }
    }

    /// Label for a platform tab.
    pub fn display_name(&self) -> &str {
        match self {
            Platform::Twitter => "Twitter / X",
            other => other.as_str(),
        }
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Twitter" => Platform::Twitter,
            "LinkedIn" => Platform::LinkedIn,
            "Instagram" => Platform::Instagram,
            _ => Platform::Other(name),
        }
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a post within its platform's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostType {
    Single,
    ThreadStart,
    ThreadMiddle,
    ThreadEnd,
    CarouselSlide,
    Other(String),
}

impl PostType {
    pub fn as_str(&self) -> &str {
        match self {
            PostType::Single => "single",
            PostType::ThreadStart => "thread_start",
            PostType::ThreadMiddle => "thread_middle",
            PostType::ThreadEnd => "thread_end",
            PostType::CarouselSlide => "carousel_slide",
            PostType::Other(name) => name,
        }
    }
}

impl From<String> for PostType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "single" => PostType::Single,
            "thread_start" => PostType::ThreadStart,
            "thread_middle" => PostType::ThreadMiddle,
            "thread_end" => PostType::ThreadEnd,
            "carousel_slide" => PostType::CarouselSlide,
            _ => PostType::Other(name),
        }
    }
}

impl From<PostType> for String {
    fn from(kind: PostType) -> Self {
        match kind {
            PostType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One platform-specific post derived from the blog draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<Platform>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<PostType>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "string_items")]
    pub suggested_hashtags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub emoji_strategy: String,
    #[serde(default, deserialize_with = "lenient")]
    pub call_to_action: String,
}

/// Any JSON value; `null` or the wrong type reads as `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// The string elements of an array; anything else reads as empty.
fn string_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl SocialPost {
    /// Length of the post copy in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Hashtags joined for display.
    pub fn hashtag_line(&self) -> String {
        self.suggested_hashtags.join(" ")
    }
}

/// Parse the posts out of a finished repurposing response.
pub fn try_extract_social_posts(text: &str) -> Result<Vec<SocialPost>, ParseError> {
    parse_object_array(text)
}

/// Parse the posts, or return an empty list if the response is unusable.
///
/// # Example
///
/// ```
/// use blogflow::social::{extract_social_posts, Platform};
///
/// let text = r#"Here you go:
/// [{"platform":"Twitter","type":"single","text":"hi","suggested_hashtags":[],"emoji_strategy":"x","call_to_action":"y"}]
/// Done."#;
/// let posts = extract_social_posts(text);
/// assert_eq!(posts.len(), 1);
/// assert_eq!(posts[0].platform, Some(Platform::Twitter));
///
/// assert!(extract_social_posts("not json at all").is_empty());
/// ```
pub fn extract_social_posts(text: &str) -> Vec<SocialPost> {
    match try_extract_social_posts(text) {
        Ok(posts) => posts,
        Err(e) => {
            warn!(error = %e, response_len = text.len(), "failed to parse social posts");
            Vec::new()
        }
    }
}

/// Posts for one platform, in their original order.
pub fn posts_for_platform<'a>(posts: &'a [SocialPost], platform: &Platform) -> Vec<&'a SocialPost> {
    posts
        .iter()
        .filter(|p| p.platform.as_ref() == Some(platform))
        .collect()
}

/// Pretty-printed JSON of the whole set, for "copy all".
pub fn posts_to_json(posts: &[SocialPost]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_C: &str = "Here you go:\n[{\"platform\":\"Twitter\",\"type\":\"single\",\"text\":\"hi\",\"suggested_hashtags\":[],\"emoji_strategy\":\"x\",\"call_to_action\":\"y\"}]\nDone.";

    #[test]
    fn test_extract_single_post_with_prose() {
        let posts = extract_social_posts(SCENARIO_C);
        assert_eq!(
            posts,
            vec![SocialPost {
                platform: Some(Platform::Twitter),
                kind: Some(PostType::Single),
                text: "hi".into(),
                suggested_hashtags: vec![],
                emoji_strategy: "x".into(),
                call_to_action: "y".into(),
            }]
        );
    }

    #[test]
    fn test_extract_degrades_to_empty() {
        assert!(extract_social_posts("not json at all").is_empty());
        assert!(extract_social_posts("[{\"platform\": \"Twitter\",").is_empty());
        assert!(extract_social_posts("[\"just\", \"strings\"]").is_empty());
        assert!(extract_social_posts("").is_empty());
    }

    #[test]
    fn test_order_preserved_across_platforms() {
        let text = r#"[
            {"platform":"LinkedIn","text":"1"},
            {"platform":"Twitter","text":"2"},
            {"platform":"LinkedIn","text":"3"}
        ]"#;
        let posts = extract_social_posts(text);
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);

        let linkedin: Vec<&str> = posts_for_platform(&posts, &Platform::LinkedIn)
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(linkedin, vec!["1", "3"]);
    }

    #[test]
    fn test_malformed_posts_kept_but_unfiltered() {
        let text = r#"[
            {"text":"no platform"},
            {"platform":"Facebook","type":"story","text":"unknown"},
            {"platform":"Instagram","type":"carousel_slide","text":"slide"}
        ]"#;
        let posts = extract_social_posts(text);
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].platform, None);
        assert_eq!(posts[1].platform, Some(Platform::Other("Facebook".into())));
        assert_eq!(posts[1].kind, Some(PostType::Other("story".into())));

        let matched: usize = Platform::KNOWN
            .iter()
            .map(|p| posts_for_platform(&posts, p).len())
            .sum();
        assert_eq!(matched, 1);
    }

    #[test]
    fn test_null_fields_default_and_keep_neighbours() {
        let text = r##"Sure! Here are your posts:
[
  {"platform":"Twitter","type":"single","text":"Ship it 🚀","suggested_hashtags":["#Rust"],"emoji_strategy":"one rocket","call_to_action":"Read more"},
  {"platform":"LinkedIn","type":"single","text":"Long form","suggested_hashtags":null,"emoji_strategy":"none","call_to_action":null}
]
Let me know if you want changes."##;
        let posts = try_extract_social_posts(text).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].suggested_hashtags, vec!["#Rust".to_string()]);
        assert_eq!(posts[0].call_to_action, "Read more");

        assert_eq!(posts[1].platform, Some(Platform::LinkedIn));
        assert_eq!(posts[1].text, "Long form");
        assert!(posts[1].suggested_hashtags.is_empty());
        assert_eq!(posts[1].call_to_action, "");
        assert_eq!(posts_for_platform(&posts, &Platform::LinkedIn).len(), 1);
    }

    #[test]
    fn test_wrong_field_types_default_per_field() {
        let text = r##"[
            {"platform":"Twitter","text":"ok"},
            {"platform":7,"type":["single"],"text":42,"suggested_hashtags":["#a",3,null,"#b"],"emoji_strategy":{},"call_to_action":false}
        ]"##;
        let posts = extract_social_posts(text);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "ok");

        let odd = &posts[1];
        assert_eq!(odd.platform, None);
        assert_eq!(odd.kind, None);
        assert_eq!(odd.text, "");
        assert_eq!(odd.suggested_hashtags, vec!["#a".to_string(), "#b".to_string()]);
        assert_eq!(odd.emoji_strategy, "");
        assert_eq!(odd.call_to_action, "");
    }

    #[test]
    fn test_non_object_element_still_rejects_whole_set() {
        let text = r#"[{"platform":"Twitter","text":"ok"}, "stray"]"#;
        assert!(try_extract_social_posts(text).is_err());
        assert!(extract_social_posts(text).is_empty());
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let posts = extract_social_posts(SCENARIO_C);
        let json = posts_to_json(&posts).unwrap();
        assert!(json.contains("\"type\": \"single\""));
        assert!(json.contains("\"platform\": \"Twitter\""));
        assert_eq!(extract_social_posts(&json), posts);
    }

    #[test]
    fn test_char_count_counts_chars() {
        let post = SocialPost {
            platform: None,
            kind: None,
            text: "🚨 go".into(),
            suggested_hashtags: vec!["#AI".into(), "#Dev".into()],
            emoji_strategy: String::new(),
            call_to_action: String::new(),
        };
        assert_eq!(post.char_count(), 4);
        assert_eq!(post.hashtag_line(), "#AI #Dev");
    }

    #[test]
    fn test_platform_labels() {
        assert_eq!(Platform::Twitter.display_name(), "Twitter / X");
        assert_eq!(Platform::LinkedIn.to_string(), "LinkedIn");
    }
}
