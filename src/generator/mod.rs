//! Generator module - writes the static site from a loaded post store

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::MarkdownRenderer;
use crate::helpers;
use crate::query::{SortKey, SortOrder};
use crate::store::PostStore;
use crate::templates::{BlogFilter, SiteRenderer, STYLESHEET};
use crate::Blog;

/// Number of newest posts carried in the Atom feed
const FEED_LIMIT: usize = 20;

/// What a generation run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub tags: usize,
    pub files: usize,
}

/// One entry of `search.json`
#[derive(Debug, Serialize)]
struct SearchEntry<'a> {
    title: &'a str,
    url: String,
    excerpt: &'a str,
    tags: &'a [String],
    date: String,
}

/// Static site generator using the built-in templates
pub struct Generator {
    blog: Blog,
    renderer: SiteRenderer,
    markdown: MarkdownRenderer,
}

impl Generator {
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: blog.renderer()?,
            markdown: MarkdownRenderer::from_config(&blog.config.highlight),
        })
    }

    /// Generate the entire site from `store`, dating relative times from `now`
    pub fn generate(&self, store: &PostStore, now: DateTime<Utc>) -> Result<GenerateStats> {
        fs::create_dir_all(&self.blog.public_dir)?;

        let mut stats = GenerateStats {
            posts: store.len(),
            tags: store.query().all_tags().len(),
            files: 0,
        };

        self.write("css/style.css", STYLESHEET, &mut stats)?;
        self.copy_source_assets(&mut stats)?;

        self.write("index.html", &self.renderer.home(store, now)?, &mut stats)?;
        self.write(
            "blog/index.html",
            &self.renderer.blog(store, &BlogFilter::default(), now)?,
            &mut stats,
        )?;
        self.write("about/index.html", &self.renderer.about(store, now)?, &mut stats)?;
        self.write("404.html", &self.renderer.not_found(store, now)?, &mut stats)?;

        self.generate_post_pages(store, now, &mut stats)?;
        self.generate_tag_pages(store, now, &mut stats)?;
        self.generate_atom_feed(store, now, &mut stats)?;
        self.generate_search_index(store, &mut stats)?;

        Ok(stats)
    }

    fn generate_post_pages(
        &self,
        store: &PostStore,
        now: DateTime<Utc>,
        stats: &mut GenerateStats,
    ) -> Result<()> {
        for post in store.posts() {
            let html = self.renderer.post(store, post, now)?;
            let path = format!("{}index.html", helpers::post_path(post));
            self.write(&path, &html, stats)?;
            tracing::debug!("Generated {}", path);
        }
        Ok(())
    }

    fn generate_tag_pages(
        &self,
        store: &PostStore,
        now: DateTime<Utc>,
        stats: &mut GenerateStats,
    ) -> Result<()> {
        let tag_dir = self.blog.config.tag_dir.trim_matches('/');
        self.write(
            &format!("{}/index.html", tag_dir),
            &self.renderer.tags(store, now)?,
            stats,
        )?;

        for tag in store.query().all_tags() {
            let path = format!("{}index.html", helpers::tag_path(&self.blog.config, &tag));
            self.write(&path, &self.renderer.tag(store, &tag, now)?, stats)?;
        }
        Ok(())
    }

    /// Atom feed of the newest posts
    fn generate_atom_feed(
        &self,
        store: &PostStore,
        now: DateTime<Utc>,
        stats: &mut GenerateStats,
    ) -> Result<()> {
        let config = &self.blog.config;
        let mut posts = store.query().sorted(SortKey::PublishedAt, SortOrder::Desc);
        posts.truncate(FEED_LIMIT);

        let updated = posts
            .iter()
            .map(|p| p.updated_at.unwrap_or(p.published_at))
            .max()
            .unwrap_or(now);

        let mut feed = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        feed.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        if !config.subtitle.is_empty() {
            feed.push_str(&format!("  <subtitle>{}</subtitle>\n", escape_xml(&config.subtitle)));
        }
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            helpers::full_url_for(config, "atom.xml")
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", helpers::full_url_for(config, "")));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated.to_rfc3339()));
        feed.push_str(&format!("  <id>{}</id>\n", helpers::full_url_for(config, "")));
        feed.push_str(&format!(
            "  <author>\n    <name>{}</name>\n  </author>\n",
            escape_xml(&config.author)
        ));

        let base_url = config.url.trim_end_matches('/');
        for post in posts {
            let link = helpers::full_url_for(config, &helpers::post_path(post));
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!(
                "    <published>{}</published>\n",
                post.published_at.to_rfc3339()
            ));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                post.updated_at.unwrap_or(post.published_at).to_rfc3339()
            ));
            if !post.excerpt.is_empty() {
                feed.push_str(&format!("    <summary>{}</summary>\n", escape_xml(&post.excerpt)));
            }
            for tag in &post.tags {
                feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
            }
            let content = absolutize_urls(&self.markdown.render(&post.content), base_url);
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                strip_invalid_xml_chars(&content).replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        self.write("atom.xml", &feed, stats)?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    /// Search index (JSON) for client-side search
    fn generate_search_index(&self, store: &PostStore, stats: &mut GenerateStats) -> Result<()> {
        let entries: Vec<SearchEntry> = store
            .posts()
            .iter()
            .map(|p| SearchEntry {
                title: &p.title,
                url: helpers::url_for(&self.blog.config, &helpers::post_path(p)),
                excerpt: &p.excerpt,
                tags: &p.tags,
                date: p.published_at.format("%Y-%m-%d").to_string(),
            })
            .collect();

        let json = serde_json::to_string_pretty(&entries)?;
        self.write("search.json", &json, stats)?;
        tracing::info!("Generated search.json");
        Ok(())
    }

    /// Copy source assets (images, etc.) to the public directory
    fn copy_source_assets(&self, stats: &mut GenerateStats) -> Result<()> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || is_post_source(path) {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            stats.files += 1;
        }

        Ok(())
    }

    /// Write `content` to `relative` under the public directory
    fn write(&self, relative: &str, content: &str, stats: &mut GenerateStats) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, content)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        stats.files += 1;
        Ok(())
    }
}

/// Markdown sources and anything under `_posts`/`_drafts` are not assets
fn is_post_source(path: &Path) -> bool {
    let is_markdown = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    );
    is_markdown
        || path
            .components()
            .any(|c| c.as_os_str() == "_posts" || c.as_os_str() == "_drafts")
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Point root-relative `href`/`src` attributes at `base_url`
fn absolutize_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
}

/// Drop characters XML 1.0 does not allow
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
