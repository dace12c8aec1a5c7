//! List site content

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::post_line;
use crate::store::PostStore;

/// Describe the posts or tags of `store`
pub fn render(store: &PostStore, content_type: &str, now: DateTime<Utc>) -> Result<String> {
    let query = store.query();
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            out.push_str(&format!("Posts ({}):\n", store.len()));
            for post in store.posts() {
                out.push_str(&post_line(post, now));
                out.push('\n');
            }
        }
        "tag" | "tags" => {
            let tags = query.tag_counts();
            out.push_str(&format!("Tags ({}):\n", tags.len()));
            for (tag, count) in tags {
                out.push_str(&format!("  {} ({})\n", tag, count));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(out)
}
