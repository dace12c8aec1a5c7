//! The post set compiled into the binary

use async_trait::async_trait;

use super::PostSource;
use crate::content::wire::decode_posts;
use crate::content::Post;
use crate::error::LoadError;

/// Sample posts shipped with the binary, in the bundled wire shape
const SAMPLE_POSTS: &str = include_str!("sample_posts.json");

/// A fixed, in-memory post list
pub struct BundledSource {
    posts: Vec<Post>,
}

impl BundledSource {
    /// Serve exactly `posts`
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    /// The sample posts compiled into the binary
    pub fn sample() -> Result<Self, LoadError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(SAMPLE_POSTS)
            .map_err(|e| LoadError::decode(format!("bundled posts: {}", e)))?;
        Ok(Self::new(decode_posts(values)))
    }
}

#[async_trait]
impl PostSource for BundledSource {
    fn describe(&self) -> String {
        format!("bundled ({} posts)", self.posts.len())
    }

    async fn fetch(&self) -> Result<Vec<Post>, LoadError> {
        Ok(self.posts.clone())
    }
}
