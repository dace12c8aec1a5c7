//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# techblog configuration

# Site
title: Tech Blog
subtitle: Notes on software, systems and the tools in between
description: ''
author: John Doe
# en or zh-CN
language: en
# IANA name such as Asia/Shanghai; empty means UTC
timezone: ''

# URL
url: http://example.com
root: /

# Directory
source_dir: source
public_dir: public
tag_dir: tags

# Writing
render_drafts: false
highlight:
  theme: base16-ocean.dark
  line_number: true

# Listing
per_page: 10
featured_count: 3
date_format: YYYY-MM-DD

# Where posts come from:
#   kind: directory   markdown files in source/_posts
#   kind: bundled     the sample posts shipped with techblog
#   kind: remote      a blog API serving GET <base_url>/posts
source:
  kind: directory
# source:
#   kind: remote
#   base_url: http://localhost:8080/api/v1
#   timeout_secs: 10
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    fs::create_dir_all(target_dir.join("source/_posts"))?;
    fs::create_dir_all(target_dir.join("source/images"))?;
    fs::write(&config_path, DEFAULT_CONFIG)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
author: John Doe
tags: [Getting Started]
---

Welcome to your new tech blog. This post lives in `source/_posts/hello-world.md`;
edit it or add more posts next to it.

<!-- more -->

## Quick start

```bash
$ techblog new "My New Post" --tags Rust,Backend
$ techblog server
```

`techblog generate` writes the static site to `public/`.
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(target_dir.join("source/_posts/hello-world.md"), sample_post)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Blog;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialized_site_loads() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();

        let blog = Blog::new(tmp.path()).unwrap();
        assert_eq!(blog.config.title, "Tech Blog");
        assert_eq!(blog.config.featured_count, 3);

        let store = blog.load_store().await.unwrap();
        let post = store.query().find_by_key("hello-world").unwrap();
        assert_eq!(post.tags, vec!["Getting Started"]);
        assert!(post.excerpt.starts_with("Welcome to your new tech blog"));
    }

    #[test]
    fn test_refuses_existing_site() {
        let tmp = TempDir::new().unwrap();
        init_site(tmp.path()).unwrap();
        assert!(init_site(tmp.path()).is_err());
    }
}
