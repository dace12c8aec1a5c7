//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. [`SiteRenderer`] turns the store and
//! the query layer into rendered pages; the generator and the server both go
//! through it, so static and dynamic pages look the same.

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, Post};
use crate::helpers::{self, Language};
use crate::i18n::I18n;
use crate::store::PostStore;

/// Stylesheet shared by every page
pub const STYLESHEET: &str = include_str!("style.css");

/// Tera instance with every built-in template registered
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Load the built-in templates, with `t(...)` looking strings up in `i18n`
    pub fn new(i18n: I18n) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("html/layout.html")),
            ("home.html", include_str!("html/home.html")),
            ("blog.html", include_str!("html/blog.html")),
            ("post.html", include_str!("html/post.html")),
            ("tag.html", include_str!("html/tag.html")),
            ("tags.html", include_str!("html/tags.html")),
            ("about.html", include_str!("html/about.html")),
            ("not_found.html", include_str!("html/not_found.html")),
            // Partials
            ("partials/header.html", include_str!("html/partials/header.html")),
            ("partials/footer.html", include_str!("html/partials/footer.html")),
            ("partials/card.html", include_str!("html/partials/card.html")),
            ("partials/loading.html", include_str!("html/partials/loading.html")),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_function("t", translate_fn(Arc::new(i18n)));

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// `t(key="nav.home")`, `t(key="blog.found", count=3)` or
/// `t(key="post.read_time", n=8)`
fn translate_fn(
    i18n: Arc<I18n>,
) -> impl Fn(&HashMap<String, tera::Value>) -> tera::Result<tera::Value> + Send + Sync {
    move |args: &HashMap<String, tera::Value>| {
        let key = match args.get("key") {
            Some(val) => tera::try_get_value!("t", "key", String, val),
            None => return Err("t: missing `key` argument".into()),
        };

        let text = if let Some(val) = args.get("count") {
            let count = tera::try_get_value!("t", "count", usize, val);
            i18n.get_plural(&key, count)
        } else if let Some(val) = args.get("n") {
            let n = tera::try_get_value!("t", "n", u64, val);
            i18n.get(&key).replace("%d", &n.to_string())
        } else {
            i18n.get(&key)
        };

        Ok(tera::Value::String(text))
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(helpers::truncate(&s, length, &omission)))
}

/// Search and tag filters of the blog listing, as found in the query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogFilter {
    pub search: String,
    pub tag: String,
}

impl BlogFilter {
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty() || !self.tag.is_empty()
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub url: String,
    pub count: usize,
}

/// A post as shown in listings
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: String,
    pub key: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub url: String,
    /// Publication date in the configured `date_format`
    pub date: String,
    pub date_short: String,
    /// Machine-readable publication date for `<time datetime>`
    pub date_iso: String,
    pub time_ago: String,
    pub read_time: u32,
    pub view_count: Option<u64>,
    pub cover_image: Option<String>,
    pub tags: Vec<TagLink>,
}

/// A post as shown on its own page
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub card: PostCard,
    pub date_long: String,
    pub updated: Option<String>,
    /// Rendered markdown body
    pub content_html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeStats {
    pub posts: usize,
    pub views: u64,
    pub tags: usize,
}

/// Renders the pages of the site from a post store
pub struct SiteRenderer {
    config: SiteConfig,
    language: Language,
    tz: Tz,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl SiteRenderer {
    /// Build a renderer using the built-in interface strings
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let i18n = I18n::builtin(config.display_language())?;
        Self::with_i18n(config, i18n)
    }

    pub fn with_i18n(config: &SiteConfig, i18n: I18n) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            language: config.display_language(),
            tz: config.tz(),
            templates: TemplateRenderer::new(i18n)?,
            markdown: MarkdownRenderer::from_config(&config.highlight),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn tag_link(&self, tag: &str) -> TagLink {
        TagLink {
            name: tag.to_string(),
            url: helpers::url_for(&self.config, &helpers::tag_path(&self.config, tag)),
        }
    }

    /// Listing view of `post`, with its age relative to `now`
    pub fn card(&self, post: &Post, now: DateTime<Utc>) -> PostCard {
        let published = post.published_at.with_timezone(&self.tz);
        PostCard {
            id: post.id.clone(),
            key: post.key().to_string(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            author: post.author.clone(),
            url: helpers::url_for(&self.config, &helpers::post_path(post)),
            date: helpers::format_date(&published, &self.config.date_format),
            date_short: helpers::format_date_short(&published, self.language),
            date_iso: helpers::date_xml(&published),
            time_ago: helpers::time_ago(&post.published_at, &now, self.language),
            read_time: post.read_time,
            view_count: post.view_count,
            cover_image: post.cover_image.clone(),
            tags: post.tags.iter().map(|t| self.tag_link(t)).collect(),
        }
    }

    /// Full view of `post` with its body rendered to HTML
    pub fn detail(&self, post: &Post, now: DateTime<Utc>) -> PostDetail {
        let published = post.published_at.with_timezone(&self.tz);
        PostDetail {
            card: self.card(post, now),
            date_long: helpers::format_date_long(&published, self.language),
            updated: post
                .updated_at
                .filter(|updated| *updated > post.published_at)
                .map(|updated| helpers::format_date_long(&updated.with_timezone(&self.tz), self.language)),
            content_html: self.markdown.render(&post.content),
        }
    }

    fn cards(&self, posts: &[&Post], now: DateTime<Utc>) -> Vec<PostCard> {
        posts.iter().map(|p| self.card(p, now)).collect()
    }

    /// Create a base context with common variables
    fn base_context(&self, store: &PostStore, nav: &str, page_title: &str, now: DateTime<Utc>) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: self.config.title.clone(),
                subtitle: self.config.subtitle.clone(),
                description: self.config.description.clone(),
                author: self.config.author.clone(),
                language: self.language.code().to_string(),
                url: self.config.url.clone(),
            },
        );
        context.insert("root", &helpers::url_for(&self.config, ""));
        context.insert("tags_url", &helpers::url_for(&self.config, &format!("{}/", self.config.tag_dir)));
        context.insert("nav", nav);
        context.insert("page_title", page_title);
        context.insert("loading", &store.is_loading());
        context.insert("current_year", &now.with_timezone(&self.tz).year());
        context
    }

    /// Home page: featured posts and site statistics
    pub fn home(&self, store: &PostStore, now: DateTime<Utc>) -> Result<String> {
        let query = store.query();
        let featured = query.featured(self.config.featured_count);

        let mut context = self.base_context(store, "home", "", now);
        context.insert("featured", &self.cards(&featured, now));
        context.insert(
            "stats",
            &HomeStats {
                posts: store.len(),
                views: query.total_views(),
                tags: query.all_tags().len(),
            },
        );
        self.templates.render("home.html", &context)
    }

    /// Blog listing narrowed by `filter`
    pub fn blog(&self, store: &PostStore, filter: &BlogFilter, now: DateTime<Utc>) -> Result<String> {
        let query = store.query();
        let posts = query.combined_filter(&filter.search, &filter.tag);

        let mut context = self.base_context(store, "blog", "", now);
        context.insert("posts", &self.cards(&posts, now));
        context.insert("count", &posts.len());
        context.insert("all_tags", &query.all_tags());
        context.insert("search", filter.search.trim());
        context.insert("tag", &filter.tag);
        context.insert("filtered", &filter.is_active());
        context.insert("clear_url", &helpers::url_for(&self.config, &helpers::blog_path("", "")));
        self.templates.render("blog.html", &context)
    }

    /// Detail page for `post`
    pub fn post(&self, store: &PostStore, post: &Post, now: DateTime<Utc>) -> Result<String> {
        let mut context = self.base_context(store, "blog", &post.title, now);
        context.insert("post", &self.detail(post, now));
        self.templates.render("post.html", &context)
    }

    /// Page listing the posts tagged `tag`
    pub fn tag(&self, store: &PostStore, tag: &str, now: DateTime<Utc>) -> Result<String> {
        let posts = store.query().filter_by_tag(tag);

        let mut context = self.base_context(store, "tags", tag, now);
        context.insert("tag", tag);
        context.insert("posts", &self.cards(&posts, now));
        context.insert("count", &posts.len());
        self.templates.render("tag.html", &context)
    }

    /// Index of every tag with its post count
    pub fn tags(&self, store: &PostStore, now: DateTime<Utc>) -> Result<String> {
        let tags: Vec<TagSummary> = store
            .query()
            .tag_counts()
            .into_iter()
            .map(|(name, count)| {
                let TagLink { name, url } = self.tag_link(&name);
                TagSummary { name, url, count }
            })
            .collect();

        let mut context = self.base_context(store, "tags", "", now);
        context.insert("tags", &tags);
        self.templates.render("tags.html", &context)
    }

    pub fn about(&self, store: &PostStore, now: DateTime<Utc>) -> Result<String> {
        let mut context = self.base_context(store, "about", "", now);
        context.insert("post_count", &store.len());
        context.insert("tag_count", &store.query().all_tags().len());
        self.templates.render("about.html", &context)
    }

    pub fn not_found(&self, store: &PostStore, now: DateTime<Utc>) -> Result<String> {
        let context = self.base_context(store, "blog", "", now);
        self.templates.render("not_found.html", &context)
    }
}
