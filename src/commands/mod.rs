//! CLI subcommands
//!
//! Commands that read posts take a loaded [`PostStore`](crate::store::PostStore)
//! and build their output as a string, so `main` decides where it goes.

pub mod clean;
pub mod featured;
pub mod generate;
pub mod init;
pub mod list;
pub mod new;
pub mod search;
pub mod show;

use chrono::{DateTime, Utc};

use crate::content::Post;
use crate::helpers;

/// One line per post: date, key and title
pub(crate) fn post_line(post: &Post, now: DateTime<Utc>) -> String {
    let tags = if post.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", post.tags.join(", "))
    };
    format!(
        "  {} ({}) {} - {}{}",
        post.published_at.format("%Y-%m-%d"),
        helpers::time_ago(&post.published_at, &now, helpers::Language::En),
        post.key(),
        post.title,
        tags
    )
}
