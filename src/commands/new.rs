//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::tags::normalize_tags;
use crate::Blog;

/// Write a new markdown post named after `title`, returning its path
pub fn create_post(blog: &Blog, title: &str, tags: &[String]) -> Result<PathBuf> {
    let title = title.trim();
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let posts_dir = blog.posts_dir();
    fs::create_dir_all(&posts_dir)?;

    let file_path = posts_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let tags = normalize_tags(tags.iter().map(String::as_str));
    let content = format!(
        "---\ntitle: {}\ndate: {}\nauthor: {}\ntags: {}\n---\n\n",
        serde_json::to_string(title)?,
        now.format("%Y-%m-%d %H:%M:%S"),
        serde_json::to_string(&blog.config.author)?,
        serde_json::to_string(&tags)?,
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_post_round_trips_through_loader() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();

        let path = create_post(
            &blog,
            "Tokio: \"Tasks\" in Depth",
            &["Rust".to_string(), "Async".to_string(), "Rust".to_string()],
        )
        .unwrap();
        assert_eq!(path.file_name().unwrap(), "tokio-tasks-in-depth.md");

        let store = blog.load_store().await.unwrap();
        let post = store.query().find_by_key("tokio-tasks-in-depth").unwrap();
        assert_eq!(post.title, "Tokio: \"Tasks\" in Depth");
        assert_eq!(post.tags, vec!["Rust", "Async"]);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        create_post(&blog, "Same", &[]).unwrap();
        assert!(create_post(&blog, "Same", &[]).is_err());
        assert!(create_post(&blog, "???", &[]).is_err());
    }
}
