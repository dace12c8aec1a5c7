//! techblog: a personal technology blog
//!
//! Posts come from a pluggable [`source::PostSource`] (bundled, markdown on
//! disk, or a remote JSON API), are loaded once into a [`store::PostStore`]
//! and are read through the pure [`query::PostQuery`] layer. On top of that
//! sit Tera-rendered pages, a static site generator and an axum server.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod query;
pub mod server;
pub mod source;
pub mod store;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::SourceConfig;
use source::{BundledSource, DirectorySource, HttpSource, PostSource};
use store::PostStore;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the blog rooted at `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// Where markdown posts live
    pub fn posts_dir(&self) -> PathBuf {
        self.source_dir.join("_posts")
    }

    /// The post source selected by the configuration
    pub fn source(&self) -> Result<Arc<dyn PostSource>> {
        let source: Arc<dyn PostSource> = match &self.config.source {
            SourceConfig::Directory => Arc::new(DirectorySource::new(
                self.posts_dir(),
                self.config.render_drafts,
            )),
            SourceConfig::Bundled => Arc::new(BundledSource::sample()?),
            SourceConfig::Remote {
                base_url,
                timeout_secs,
            } => Arc::new(HttpSource::new(
                base_url,
                Duration::from_secs(*timeout_secs),
            )?),
        };
        Ok(source)
    }

    /// Load the post set once from the configured source
    pub async fn load_store(&self) -> Result<PostStore> {
        let source = self.source()?;
        Ok(PostStore::load(source.as_ref()).await)
    }

    /// Interface strings, with overrides from `languages/` applied
    pub fn i18n(&self) -> Result<i18n::I18n> {
        let mut i18n = i18n::I18n::builtin(self.config.display_language())?;
        i18n.load_languages(self.base_dir.join("languages"))?;
        Ok(i18n)
    }

    /// Page renderer for this site
    pub fn renderer(&self) -> Result<templates::SiteRenderer> {
        templates::SiteRenderer::with_i18n(&self.config, self.i18n()?)
    }

    /// Initialize a new site
    pub fn init(&self) -> Result<()> {
        commands::init::init_site(&self.base_dir)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<generator::GenerateStats> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults_without_config_file() {
        let tmp = TempDir::new().unwrap();
        let blog = Blog::new(tmp.path()).unwrap();
        assert_eq!(blog.posts_dir(), tmp.path().join("source").join("_posts"));
        assert_eq!(blog.public_dir, tmp.path().join("public"));

        // No posts directory yet: loaded and empty
        let store = blog.load_store().await.unwrap();
        assert!(!store.is_loading());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_bundled_source_from_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("_config.yml"),
            "title: Bundled\nsource:\n  kind: bundled\n",
        )
        .unwrap();

        let blog = Blog::new(tmp.path()).unwrap();
        assert_eq!(blog.config.title, "Bundled");
        let store = blog.load_store().await.unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_remote_source_requires_valid_url() {
        let config = config::SiteConfig {
            source: SourceConfig::Remote {
                base_url: "not a url".to_string(),
                timeout_secs: 1,
            },
            ..config::SiteConfig::default()
        };
        let blog = Blog::with_config(PathBuf::from("."), config);
        assert!(blog.source().is_err());
    }
}
