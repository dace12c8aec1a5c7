//! Markdown posts on disk

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::PostSource;
use crate::content::markdown::split_excerpt;
use crate::content::{FrontMatter, Post};
use crate::error::LoadError;

/// Loads posts from `<dir>/*.md`, newest first
pub struct DirectorySource {
    posts_dir: PathBuf,
    include_drafts: bool,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(posts_dir: P, include_drafts: bool) -> Self {
        Self {
            posts_dir: posts_dir.as_ref().to_path_buf(),
            include_drafts,
        }
    }

    fn load_all(&self) -> Result<Vec<Post>, LoadError> {
        if !self.posts_dir.exists() {
            tracing::debug!("No posts directory at {:?}", self.posts_dir);
            return Ok(Vec::new());
        }

        // An unreadable posts directory fails the load; unreadable files are skipped
        fs::read_dir(&self.posts_dir).map_err(|source| LoadError::Io {
            path: self.posts_dir.clone(),
            source,
        })?;

        let mut posts = Vec::new();

        for entry in WalkDir::new(&self.posts_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            match load_post(path) {
                Ok(post) if post.is_published() || self.include_drafts => {
                    tracing::debug!("Loaded {:?} as {}", path, post.slug);
                    posts.push(post);
                }
                Ok(_) => tracing::debug!("Skipping unpublished {:?}", path),
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }

        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        Ok(posts)
    }
}

#[async_trait]
impl PostSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {:?}", self.posts_dir)
    }

    async fn fetch(&self) -> Result<Vec<Post>, LoadError> {
        self.load_all()
    }
}

/// Build a post from one markdown file
fn load_post(path: &Path) -> Result<Post> {
    let content = fs::read_to_string(path)?;
    let (fm, body) = FrontMatter::parse(&content)?;

    let file_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    let file_modified = fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);

    let published_at = fm
        .parse_date()
        .or(file_modified)
        .unwrap_or_else(Utc::now);
    let updated_at = fm.parse_updated().or(file_modified);

    let title = fm.title.clone().unwrap_or_else(|| file_stem.clone());
    let id = fm
        .id
        .clone()
        .map(|id| id.into_string())
        .unwrap_or_else(|| file_stem.clone());

    let excerpt = fm
        .excerpt
        .clone()
        .or_else(|| split_excerpt(body).0.map(str::to_string))
        .unwrap_or_default();

    let mut post = Post::new(id, title, published_at);
    // Files are routed by name unless the front-matter says otherwise
    post.slug = fm.slug.unwrap_or(file_stem);
    post.content = body.to_string();
    post.excerpt = excerpt;
    post.author = fm.author.unwrap_or_default();
    post.updated_at = updated_at;
    post.tags = fm.tags;
    post.cover_image = fm.cover_image;
    post.read_time = fm.read_time.unwrap_or(0);
    post.published = Some(fm.published);

    Ok(post.normalized()?)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
