//! Show a single post

use anyhow::Result;

use crate::store::PostStore;

/// Full text of the post with `key` (slug, or id as a fallback)
pub fn render(store: &PostStore, key: &str) -> Result<String> {
    let Some(post) = store.query().resolve(key) else {
        anyhow::bail!("No post with key {:?}", key);
    };

    let mut out = format!("{}\n{}\n", post.title, "=".repeat(post.title.chars().count()));
    out.push_str(&format!("key:       {}\n", post.key()));
    out.push_str(&format!("id:        {}\n", post.id));
    if !post.author.is_empty() {
        out.push_str(&format!("author:    {}\n", post.author));
    }
    out.push_str(&format!("published: {}\n", post.published_at.to_rfc3339()));
    if let Some(updated) = post.updated_at {
        out.push_str(&format!("updated:   {}\n", updated.to_rfc3339()));
    }
    out.push_str(&format!("read time: {} min\n", post.read_time));
    if let Some(views) = post.view_count {
        out.push_str(&format!("views:     {}\n", views));
    }
    if !post.tags.is_empty() {
        out.push_str(&format!("tags:      {}\n", post.tags.join(", ")));
    }
    out.push('\n');
    out.push_str(post.content.trim_end());
    out.push('\n');

    Ok(out)
}
