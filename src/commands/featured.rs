//! Show the featured posts

use chrono::{DateTime, Utc};

use super::post_line;
use crate::store::PostStore;

/// The first `count` posts in store order
pub fn render(store: &PostStore, count: usize, now: DateTime<Utc>) -> String {
    let featured = store.query().featured(count);
    let mut out = format!("Featured ({} of {}):\n", featured.len(), store.len());
    for post in featured {
        out.push_str(&post_line(post, now));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Post;

    #[test]
    fn test_featured_caps_at_store_size() {
        let now = Utc::now();
        let store = PostStore::from_posts(vec![
            Post::new("1", "One", now),
            Post::new("2", "Two", now),
        ]);

        let out = render(&store, 3, now);
        assert!(out.starts_with("Featured (2 of 2):"));

        let out = render(&store, 1, now);
        assert!(out.contains("one - One"));
        assert!(!out.contains("two - Two"));
    }
}
