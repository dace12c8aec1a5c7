//! Error types for post sources and post normalization

use std::path::PathBuf;
use thiserror::Error;

/// Failure while producing the post set from a source
#[derive(Debug, Error)]
pub enum LoadError {
    /// The request never produced a response (connect failure, timeout, ...)
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    /// The payload could not be decoded into posts
    #[error("invalid post payload: {0}")]
    Decode(String),

    /// A local file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Failure while normalizing a single external record into a `Post`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostError {
    #[error("post {id} has no title")]
    MissingTitle { id: String },

    #[error("post {id} has an unreadable {field}: {value:?}")]
    InvalidDate {
        id: String,
        field: &'static str,
        value: String,
    },
}
