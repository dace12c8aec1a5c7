//! Query layer - derived views over the post set
//!
//! Every operation is a pure function of the borrowed posts and its
//! arguments. An unloaded store is just an empty slice, so nothing here can
//! fail.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::content::Post;

/// Number of posts shown as featured when the caller has no preference
pub const DEFAULT_FEATURED_COUNT: usize = 3;

/// Read-only view over an ordered post sequence
#[derive(Debug, Clone, Copy)]
pub struct PostQuery<'a> {
    posts: &'a [Post],
}

/// Field to order posts by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PublishedAt,
    /// Last update, or publication for posts never updated
    UpdatedAt,
    ViewCount,
    ReadTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Criteria combined with AND. Empty fields match every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter<'f> {
    /// Case-insensitive substring of title or excerpt
    pub search: &'f str,
    /// Exact tag
    pub tag: &'f str,
    /// Case-insensitive substring of the author
    pub author: &'f str,
}

impl PostFilter<'_> {
    pub fn matches(&self, post: &Post) -> bool {
        matches_search(post, &self.search.trim().to_lowercase())
            && (self.tag.is_empty() || post.has_tag(self.tag))
            && matches_author(post, &self.author.trim().to_lowercase())
    }
}

/// One page of a post listing
#[derive(Debug, Clone, Serialize)]
pub struct PageSlice<'a> {
    pub posts: Vec<&'a Post>,
    /// 1-based page number, clamped to at least 1
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<'a> PostQuery<'a> {
    pub fn new(posts: &'a [Post]) -> Self {
        Self { posts }
    }

    /// All posts in store order
    pub fn all(&self) -> Vec<&'a Post> {
        self.posts.iter().collect()
    }

    /// Look up a post by its routing key
    pub fn find_by_key(&self, key: &str) -> Option<&'a Post> {
        self.posts.iter().find(|p| p.key() == key)
    }

    /// Look up a post by its source identifier
    pub fn find_by_id(&self, id: &str) -> Option<&'a Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// Look up by key, then by id
    pub fn resolve(&self, key_or_id: &str) -> Option<&'a Post> {
        self.find_by_key(key_or_id)
            .or_else(|| self.find_by_id(key_or_id))
    }

    /// Posts carrying `tag` (exact, case-sensitive). An empty tag matches
    /// nothing.
    pub fn filter_by_tag(&self, tag: &str) -> Vec<&'a Post> {
        if tag.is_empty() {
            return Vec::new();
        }
        self.posts.iter().filter(|p| p.has_tag(tag)).collect()
    }

    /// Posts whose title or excerpt contains `term`, ignoring case. An empty
    /// term matches every post.
    pub fn filter_by_search(&self, term: &str) -> Vec<&'a Post> {
        let needle = term.trim().to_lowercase();
        self.posts
            .iter()
            .filter(|p| matches_search(p, &needle))
            .collect()
    }

    /// Search and tag filters combined; each one is skipped when empty
    pub fn combined_filter(&self, term: &str, tag: &str) -> Vec<&'a Post> {
        self.filter(&PostFilter {
            search: term,
            tag,
            ..PostFilter::default()
        })
    }

    /// Posts matching every criterion of `filter`, in store order
    pub fn filter(&self, filter: &PostFilter<'_>) -> Vec<&'a Post> {
        self.posts.iter().filter(|p| filter.matches(p)).collect()
    }

    /// The first `count` posts in store order
    pub fn featured(&self, count: usize) -> Vec<&'a Post> {
        self.posts.iter().take(count).collect()
    }

    /// The first [`DEFAULT_FEATURED_COUNT`] posts
    pub fn featured_default(&self) -> Vec<&'a Post> {
        self.featured(DEFAULT_FEATURED_COUNT)
    }

    /// Every tag in use, once each, sorted
    pub fn all_tags(&self) -> Vec<String> {
        self.posts
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Tags with the number of posts using them, most used first
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.posts.iter().flat_map(|p| p.tags.iter()) {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }

        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, n)| (tag.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Sum of view counts; posts without a counter add nothing
    pub fn total_views(&self) -> u64 {
        self.posts.iter().filter_map(|p| p.view_count).sum()
    }

    /// All posts ordered by `key`. Ties keep store order.
    pub fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<&'a Post> {
        let mut posts = self.all();
        sort_posts(&mut posts, key, order);
        posts
    }
}

/// Stable sort of a post listing by `key`
pub fn sort_posts(posts: &mut [&Post], key: SortKey, order: SortOrder) {
    posts.sort_by(|a, b| {
        let ord = match key {
            SortKey::PublishedAt => a.published_at.cmp(&b.published_at),
            SortKey::UpdatedAt => a
                .updated_at
                .unwrap_or(a.published_at)
                .cmp(&b.updated_at.unwrap_or(b.published_at)),
            SortKey::ViewCount => a.view_count.unwrap_or(0).cmp(&b.view_count.unwrap_or(0)),
            SortKey::ReadTime => a.read_time.cmp(&b.read_time),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn matches_search(post: &Post, needle: &str) -> bool {
    needle.is_empty()
        || post.title.to_lowercase().contains(needle)
        || post.excerpt.to_lowercase().contains(needle)
}

fn matches_author(post: &Post, needle: &str) -> bool {
    needle.is_empty() || post.author.to_lowercase().contains(needle)
}

/// Cut a listing into 1-based pages. `per_page` of zero is treated as one.
pub fn paginate<'a>(posts: &[&'a Post], page: usize, per_page: usize) -> PageSlice<'a> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = posts.len();
    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    PageSlice {
        posts: posts[start..end].to_vec(),
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page),
    }
}
