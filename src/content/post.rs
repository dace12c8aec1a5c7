//! The canonical post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tags::{deserialize_tags, normalize_tags};
use crate::error::PostError;

/// Reading speed used to estimate `read_time`
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of words kept when an excerpt has to be generated
pub const EXCERPT_WORDS: usize = 30;

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Opaque identifier from the source
    pub id: String,

    /// URL-safe routing key, unique within a store
    #[serde(default)]
    pub slug: String,

    pub title: String,

    /// Markdown body
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub excerpt: String,

    #[serde(default)]
    pub author: String,

    /// Publication date
    pub published_at: DateTime<Utc>,

    /// Last updated date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Ordered, duplicate-free tag list
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    /// Estimated reading time in minutes
    #[serde(default)]
    pub read_time: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        let id = id.into();
        let title = title.into();
        let slug = derive_slug(&title, &id);
        Self {
            id,
            slug,
            title,
            content: String::new(),
            excerpt: String::new(),
            author: String::new(),
            published_at,
            updated_at: None,
            tags: Vec::new(),
            cover_image: None,
            read_time: 0,
            view_count: None,
            published: None,
        }
    }

    /// The lookup key used for routing
    pub fn key(&self) -> &str {
        &self.slug
    }

    /// Whether the post carries `tag` (exact, case-sensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the post is visible; posts without a flag are visible
    pub fn is_published(&self) -> bool {
        self.published.unwrap_or(true)
    }

    /// Enforce the model invariants on a post built from external data.
    ///
    /// Fills in a missing slug, excerpt and reading time, cleans the tag list
    /// and drops a blank cover image.
    pub fn normalized(mut self) -> Result<Self, PostError> {
        self.id = self.id.trim().to_string();
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(PostError::MissingTitle { id: self.id });
        }

        let slug = self.slug.trim();
        self.slug = if slug.is_empty() {
            derive_slug(&self.title, &self.id)
        } else {
            slug::slugify(slug)
        };

        self.tags = normalize_tags(std::mem::take(&mut self.tags));

        if self.excerpt.trim().is_empty() {
            self.excerpt = generate_excerpt(&self.content);
        }
        if self.read_time == 0 {
            self.read_time = estimate_read_time(&self.content);
        }
        if self.cover_image.as_deref().is_some_and(|c| c.trim().is_empty()) {
            self.cover_image = None;
        }

        Ok(self)
    }
}

/// Slugify the title, falling back to the id when the title has no usable
/// characters
fn derive_slug(title: &str, id: &str) -> String {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        slug::slugify(id)
    } else {
        slug
    }
}

/// Count words in text. CJK ideographs count as one word each.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphanumeric() && !is_cjk(c) {
            if !in_word {
                in_word = true;
                count += 1;
            }
        } else if is_cjk(c) {
            count += 1;
            in_word = false;
        } else {
            in_word = false;
        }
    }

    count
}

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Estimated minutes to read `content`, at least one
pub fn estimate_read_time(content: &str) -> u32 {
    let minutes = count_words(content) / WORDS_PER_MINUTE;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// First `EXCERPT_WORDS` whitespace-separated words of the body, skipping
/// markdown headings
pub fn generate_excerpt(content: &str) -> String {
    let text: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .flat_map(str::split_whitespace)
        .collect();

    if text.len() <= EXCERPT_WORDS {
        text.join(" ")
    } else {
        format!("{}...", text[..EXCERPT_WORDS].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_post_derives_slug() {
        let post = Post::new("1", "Go in Production: Lessons", date());
        assert_eq!(post.key(), "go-in-production-lessons");
    }

    #[test]
    fn test_slug_falls_back_to_id() {
        let post = Post::new("42", "!!!", date());
        assert_eq!(post.slug, "42");
    }

    #[test]
    fn test_normalized_fills_derived_fields() {
        let mut post = Post::new("7", "  Hello  ", date());
        post.content = format!("# Heading\n\n{}", "word ".repeat(250));
        post.tags = vec!["a".into(), "a".into(), "b".into()];
        post.cover_image = Some("  ".into());

        let post = post.normalized().unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.tags, vec!["a", "b"]);
        assert_eq!(post.read_time, 1);
        assert!(post.excerpt.ends_with("..."));
        assert!(!post.excerpt.contains('#'));
        assert_eq!(post.cover_image, None);
    }

    #[test]
    fn test_normalized_rejects_blank_title() {
        let post = Post::new("9", " ", date());
        assert_eq!(
            post.normalized(),
            Err(PostError::MissingTitle { id: "9".into() })
        );
    }

    #[test]
    fn test_count_words_mixed() {
        assert_eq!(count_words("hello world"), 2);
        assert_eq!(count_words("并发渲染 React"), 5);
    }

    #[test]
    fn test_estimate_read_time() {
        assert_eq!(estimate_read_time(""), 1);
        assert_eq!(estimate_read_time(&"word ".repeat(1000)), 5);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut post = Post::new("1", "T", date());
        post.view_count = Some(3);
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("publishedAt").is_some());
        assert_eq!(json["viewCount"], 3);
        assert!(json.get("coverImage").is_none());
    }
}
