//! Generate static files

use anyhow::Result;
use std::time::Instant;

use crate::generator::{GenerateStats, Generator};
use crate::Blog;

/// Load the posts and write the static site
pub async fn run(blog: &Blog) -> Result<GenerateStats> {
    let start = Instant::now();

    let store = blog.load_store().await?;
    let stats = Generator::new(blog)?.generate(&store, chrono::Utc::now())?;

    tracing::info!(
        "Generated {} files for {} posts and {} tags in {:.2}s",
        stats.files,
        stats.posts,
        stats.tags,
        start.elapsed().as_secs_f64()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generates_initialized_site() {
        let tmp = TempDir::new().unwrap();
        crate::commands::init::init_site(tmp.path()).unwrap();

        let blog = Blog::new(tmp.path()).unwrap();
        let stats = run(&blog).await.unwrap();
        assert_eq!(stats.posts, 1);
        assert!(blog.public_dir.join("blog/hello-world/index.html").is_file());
    }
}
