//! Search posts by text and tag

use chrono::{DateTime, Utc};

use super::post_line;
use crate::store::PostStore;

/// Posts matching `term` in title or excerpt and carrying `tag`; either
/// filter is skipped when empty
pub fn render(store: &PostStore, term: &str, tag: &str, now: DateTime<Utc>) -> String {
    let posts = store.query().combined_filter(term, tag);

    let mut filters = Vec::new();
    if !term.trim().is_empty() {
        filters.push(format!("search {:?}", term.trim()));
    }
    if !tag.is_empty() {
        filters.push(format!("tag {:?}", tag));
    }

    let mut out = if filters.is_empty() {
        format!("Found {} posts:\n", posts.len())
    } else {
        format!("Found {} posts for {}:\n", posts.len(), filters.join(", "))
    };
    for post in posts {
        out.push_str(&post_line(post, now));
        out.push('\n');
    }
    out
}
