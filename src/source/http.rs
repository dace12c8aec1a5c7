//! Reqwest-backed blog API source.
//!
//! Issues `GET <base_url>/posts` and decodes the `{ "data": [...] }`
//! envelope. Transport failures, non-success statuses and undecodable bodies
//! are reported as [`LoadError`]s.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use super::PostSource;
use crate::content::wire::decode_envelope;
use crate::content::Post;
use crate::error::LoadError;

const USER_AGENT: &str = concat!("techblog/", env!("CARGO_PKG_VERSION"));

/// Fetches posts from a remote blog API
pub struct HttpSource {
    client: Client,
    posts_url: Url,
}

impl HttpSource {
    /// Build a source for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` is not a valid URL or the client
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let posts_url = posts_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, posts_url })
    }

    pub fn posts_url(&self) -> &Url {
        &self.posts_url
    }
}

#[async_trait]
impl PostSource for HttpSource {
    fn describe(&self) -> String {
        format!("remote {}", self.posts_url)
    }

    async fn fetch(&self) -> Result<Vec<Post>, LoadError> {
        let url = self.posts_url.to_string();
        let response = self
            .client
            .get(self.posts_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let posts = decode_envelope(&body)?;
        tracing::debug!("Fetched {} posts from {}", posts.len(), url);
        Ok(posts)
    }
}

/// `<base_url>/posts`, tolerating a trailing slash on the base
fn posts_url(base_url: &str) -> anyhow::Result<Url> {
    let base = format!("{}/", base_url.trim().trim_end_matches('/'));
    Ok(Url::parse(&base)?.join("posts")?)
}

fn transport_error(url: &str, error: reqwest::Error) -> LoadError {
    let message = if error.is_timeout() {
        format!("timed out: {}", error)
    } else {
        error.to_string()
    };
    LoadError::Transport {
        url: url.to_string(),
        message,
    }
}
