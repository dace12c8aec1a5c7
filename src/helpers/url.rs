//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;
use crate::content::Post;

/// Characters left as-is in query values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Prefix `path` with the site root
///
/// # Examples
/// ```ignore
/// url_for(&config, "/blog/") // -> "/techblog/blog/" with root "/techblog/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    match path.trim_start_matches('/') {
        "" => format!("{}/", root),
        path => format!("{}/{}", root, path),
    }
}

/// Absolute URL including the site domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    format!("{}{}", config.url.trim_end_matches('/'), url_for(config, path))
}

/// Route of a post detail page, relative to the root
pub fn post_path(post: &Post) -> String {
    format!("blog/{}/", post.key())
}

/// Route of a tag page, relative to the root
pub fn tag_path(config: &SiteConfig, tag: &str) -> String {
    format!("{}/{}/", config.tag_dir.trim_matches('/'), tag_segment(tag))
}

/// Path segment of a tag page, distinct for every distinct tag.
///
/// A tag that already is a slug is used as-is. Any other tag gets its slug
/// followed by `--` and the hex bytes of the exact tag, so `Go` and `go`
/// never share a page and symbol-only tags never yield an empty segment.
/// Slugs never contain `--`, so the two forms cannot meet.
pub fn tag_segment(tag: &str) -> String {
    let slug = slug::slugify(tag);
    if slug == tag {
        return slug;
    }
    let hex: String = tag.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("{}--{}", slug, hex)
}

/// Blog listing route carrying the active filters as query parameters.
/// Empty filters are left out.
pub fn blog_path(search: &str, tag: &str) -> String {
    let params: Vec<String> = [("search", search.trim()), ("tag", tag)]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{}={}", name, encode_query_value(value)))
        .collect();

    if params.is_empty() {
        "blog/".to_string()
    } else {
        format!("blog/?{}", params.join("&"))
    }
}

/// Percent-encode a query string value
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com".to_string(),
            root: "/techblog/".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/style.css"), "/techblog/css/style.css");
        assert_eq!(url_for(&config, "blog/"), "/techblog/blog/");
        assert_eq!(url_for(&config, ""), "/techblog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/about/"),
            "https://example.com/techblog/about/"
        );
    }

    #[test]
    fn test_post_and_tag_paths() {
        let config = SiteConfig::default();
        let post = Post::new("1", "Hello World", Utc::now());
        assert_eq!(post_path(&post), "blog/hello-world/");
        assert_eq!(tag_path(&config, "rust"), "tags/rust/");
        assert_eq!(tag_path(&config, "Go"), "tags/go--476f/");
    }

    #[test]
    fn test_tag_segments_are_distinct() {
        let tags = ["Go", "go", "GO", "++", "C++", "c", "machine-learning", "Machine Learning"];
        let segments: Vec<String> = tags.iter().map(|t| tag_segment(t)).collect();
        for (i, a) in segments.iter().enumerate() {
            assert!(!a.is_empty());
            for b in &segments[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(tag_segment("go"), "go");
        assert_eq!(tag_segment("++"), "--2b2b");
    }

    #[test]
    fn test_blog_path_encodes_filters() {
        assert_eq!(blog_path("", ""), "blog/");
        assert_eq!(blog_path("go", ""), "blog/?search=go");
        assert_eq!(blog_path("", "C++"), "blog/?tag=C%2B%2B");
        assert_eq!(
            blog_path("react hooks", "Frontend"),
            "blog/?search=react%20hooks&tag=Frontend"
        );
    }
}
