//! Site configuration (_config.yml)

use anyhow::Result;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::helpers::Language;
use crate::query::DEFAULT_FEATURED_COUNT;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub tag_dir: String,

    // Writing
    pub render_drafts: bool,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Listing
    pub per_page: usize,
    pub featured_count: usize,

    // Date / Time format
    pub date_format: String,

    // Where posts come from
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Tech Blog".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            timezone: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            tag_dir: "tags".to_string(),

            render_drafts: false,
            highlight: HighlightConfig::default(),

            per_page: 10,
            featured_count: DEFAULT_FEATURED_COUNT,

            date_format: "YYYY-MM-DD".to_string(),

            source: SourceConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Display language derived from `language`
    pub fn display_language(&self) -> Language {
        Language::from_tag(&self.language)
    }

    /// Timezone used to display dates; UTC when unset or unknown
    pub fn tz(&self) -> Tz {
        if self.timezone.trim().is_empty() {
            return Tz::UTC;
        }
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            Tz::UTC
        })
    }
}

/// Post source selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Markdown files under `<source_dir>/_posts`
    #[default]
    Directory,
    /// The post set compiled into the binary
    Bundled,
    /// A blog API exposing `GET <base_url>/posts`
    Remote {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    10
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Tech Blog");
        assert_eq!(config.featured_count, 3);
        assert_eq!(config.source, SourceConfig::Directory);
        assert_eq!(config.tz(), Tz::UTC);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
author: Test User
language: zh-CN
timezone: Asia/Shanghai
per_page: 20
source:
  kind: remote
  base_url: http://localhost:8080/api/v1
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.per_page, 20);
        assert_eq!(config.display_language(), Language::ZhCn);
        assert_eq!(config.tz(), chrono_tz::Asia::Shanghai);
        assert_eq!(
            config.source,
            SourceConfig::Remote {
                base_url: "http://localhost:8080/api/v1".to_string(),
                timeout_secs: 10,
            }
        );
    }

    #[test]
    fn test_bundled_source_and_bad_timezone() {
        let yaml = "timezone: Mars/Olympus\nsource:\n  kind: bundled\n";
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source, SourceConfig::Bundled);
        assert_eq!(config.tz(), Tz::UTC);
    }
}
