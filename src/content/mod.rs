//! Content module - the post model, its wire shapes and markdown processing

mod frontmatter;
pub mod markdown;
mod post;
pub mod tags;
pub mod wire;

pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use post::{count_words, estimate_read_time, generate_excerpt, Post};
pub use wire::WirePost;
