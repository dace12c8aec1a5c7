//! Post shapes accepted from external sources, and their normalization
//! into the canonical [`Post`].
//!
//! Three shapes are accepted:
//! - canonical: what this crate serializes (`publishedAt`, tag list)
//! - backend: numeric `id`, `createdAt`, tags as a JSON-encoded string,
//!   `viewCount`, `published` and `slug`
//! - bundled: string `id`, `publishDate`, tag list, no slug

use serde::Deserialize;

use super::tags::RawTags;
use super::Post;
use crate::error::{LoadError, PostError};
use crate::helpers::parse_datetime;

/// Identifier that may arrive as a number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Post as served by the blog backend API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPost {
    pub id: RawId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: RawTags,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub read_time: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub slug: String,
}

/// Post as written in the bundled data set
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledPost {
    pub id: RawId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    pub publish_date: String,
    #[serde(default)]
    pub tags: RawTags,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub read_time: i64,
}

/// Any accepted post shape
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WirePost {
    Canonical(Post),
    Backend(BackendPost),
    Bundled(BundledPost),
}

impl WirePost {
    /// Convert into a canonical post, enforcing model invariants
    pub fn into_post(self) -> Result<Post, PostError> {
        match self {
            WirePost::Canonical(post) => post.normalized(),
            WirePost::Backend(post) => post.into_post(),
            WirePost::Bundled(post) => post.into_post(),
        }
    }
}

impl BackendPost {
    pub fn into_post(self) -> Result<Post, PostError> {
        let id = self.id.into_string();
        let published_at = parse_field(&id, "createdAt", &self.created_at)?;
        let updated_at = match self.updated_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_field(&id, "updatedAt", raw)?),
            _ => None,
        };

        let mut post = Post::new(id, self.title, published_at);
        post.slug = self.slug;
        post.content = self.content;
        post.excerpt = self.excerpt;
        post.author = self.author;
        post.updated_at = updated_at;
        post.tags = self.tags.into_tags();
        post.cover_image = self.cover_image;
        post.read_time = clamp_u32(self.read_time);
        post.view_count = Some(u64::try_from(self.view_count).unwrap_or(0));
        post.published = self.published;
        post.normalized()
    }
}

impl BundledPost {
    pub fn into_post(self) -> Result<Post, PostError> {
        let id = self.id.into_string();
        let published_at = parse_field(&id, "publishDate", &self.publish_date)?;

        let mut post = Post::new(id, self.title, published_at);
        post.content = self.content;
        post.excerpt = self.excerpt;
        post.author = self.author;
        post.tags = self.tags.into_tags();
        post.cover_image = self.cover_image;
        post.read_time = clamp_u32(self.read_time);
        post.normalized()
    }
}

fn parse_field(
    id: &str,
    field: &'static str,
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, PostError> {
    parse_datetime(raw).ok_or_else(|| PostError::InvalidDate {
        id: id.to_string(),
        field,
        value: raw.to_string(),
    })
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Decode a list of JSON values into posts.
///
/// Elements that do not match any shape, or that fail normalization, are
/// skipped with a warning.
pub fn decode_posts(values: Vec<serde_json::Value>) -> Vec<Post> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let wire = match serde_json::from_value::<WirePost>(value) {
                Ok(wire) => wire,
                Err(e) => {
                    tracing::warn!("Skipping post #{}: unrecognized shape: {}", i, e);
                    return None;
                }
            };
            match wire.into_post() {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping post #{}: {}", i, e);
                    None
                }
            }
        })
        .collect()
}

/// Response envelope of the posts endpoint: `{ "data": [...] }`
#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

/// Decode a posts endpoint body. A missing or null `data` is an empty list.
pub fn decode_envelope(body: &[u8]) -> Result<Vec<Post>, LoadError> {
    let envelope: PostsEnvelope = serde_json::from_slice(body)
        .map_err(|e| LoadError::decode(format!("invalid posts envelope: {}", e)))?;
    Ok(decode_posts(envelope.data.unwrap_or_default()))
}
