//! Front-matter parsing for markdown posts

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::wire::RawId;
use crate::helpers::parse_datetime;

/// Accept `tags: Go` as well as `tags: [Go, Docker]`
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
        None => Vec::new(),
    })
}

/// Front-matter of a post file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub id: Option<RawId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub author: Option<String>,
    pub excerpt: Option<String>,
    #[serde(alias = "coverImage")]
    pub cover_image: Option<String>,
    #[serde(alias = "readTime")]
    pub read_time: Option<u32>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    /// Posts are published unless they say otherwise
    pub published: bool,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            slug: None,
            date: None,
            updated: None,
            author: None,
            excerpt: None,
            cover_image: None,
            read_time: None,
            tags: Vec::new(),
            published: true,
        }
    }
}

impl FrontMatter {
    /// Split a file into front-matter and body.
    ///
    /// Files without front-matter get the defaults and their whole content
    /// as body.
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Ok(Self::parse_yaml(content));
        }
        if content.starts_with(";;;") {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return (FrontMatter::default(), content);
        };
        let yaml = &rest[..end_pos];
        let body = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return (FrontMatter::default(), body);
        }
        // A leading `---` can also be a markdown thematic break
        if !looks_like_yaml(yaml) {
            return (FrontMatter::default(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml) {
            Ok(fm) => (fm, body),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                (FrontMatter::default(), content)
            }
        }
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        let rest = &content[3..];
        let end_pos = rest
            .find(";;;")
            .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
        let fm: FrontMatter = serde_json::from_str(&rest[..end_pos])
            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
        let body = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
        Ok((fm, body))
    }

    pub fn parse_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_datetime)
    }

    pub fn parse_updated(&self) -> Option<DateTime<Utc>> {
        self.updated.as_deref().and_then(parse_datetime)
    }
}

/// At least one line must be a `key: value` pair with a plain identifier
/// key (not a URL scheme)
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return false;
        }
        let Some((key, value)) = line.split_once(':') else {
            return false;
        };
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp")
            && (value.is_empty() || value.starts_with(' '))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
author: Tech Explorer
cover_image: /images/hello.png
tags:
  - rust
  - blog
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.author.as_deref(), Some("Tech Explorer"));
        assert_eq!(fm.cover_image.as_deref(), Some("/images/hello.png"));
        assert_eq!(fm.tags, vec!["rust", "blog"]);
        assert!(fm.published);
        assert!(body.starts_with("This is the content."));
        assert_eq!(
            fm.parse_date().unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2024-01-15 10:30"
        );
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#";;;
{"title": "Test Post", "tags": ["a", "b"], "published": false, "readTime": 4}
;;;
This is content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert_eq!(fm.read_time, Some(4));
        assert!(!fm.published);
        assert!(body.contains("This is content."));
    }

    #[test]
    fn test_single_string_tag() {
        let content = "---\ntitle: One\ntags: Notes\n---\nBody\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Check out https://example.com/path and a list:
- Item 1

---
More content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert!(body.contains("https://example.com"));
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, body) = FrontMatter::parse("Just text").unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(body, "Just text");
    }
}
