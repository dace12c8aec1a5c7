//! Post sources - where the post set of a session comes from
//!
//! A source only knows how to produce posts; it never decides what happens
//! when that fails. The store turns every error into an empty result.

mod bundled;
mod directory;
mod http;

use async_trait::async_trait;

use crate::content::Post;
use crate::error::LoadError;

pub use bundled::BundledSource;
pub use directory::DirectorySource;
pub use http::HttpSource;

/// Something that can produce the full, ordered post set
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Produce every post, in the order they should be presented
    async fn fetch(&self) -> Result<Vec<Post>, LoadError>;
}
