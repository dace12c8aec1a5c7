//! Tag collections: decoding from the shapes sources send, and deduplication

use serde::{Deserialize, Deserializer};

/// Tag field as it arrives over the wire.
///
/// The backend stores tags as a JSON-encoded string (`"[\"Go\",\"Docker\"]"`),
/// while the bundled data and the canonical shape use a plain list. Anything
/// else lands in `Other` so a bad tag field never rejects the whole post.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    List(Vec<String>),
    Encoded(String),
    Other(serde_json::Value),
}

impl Default for RawTags {
    fn default() -> Self {
        RawTags::List(Vec::new())
    }
}

impl RawTags {
    /// Decode into a canonical tag list. Never fails: undecodable input
    /// yields an empty list.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            RawTags::List(tags) => normalize_tags(tags),
            RawTags::Encoded(raw) => decode_tags(&raw),
            RawTags::Other(serde_json::Value::Null) => Vec::new(),
            RawTags::Other(value) => {
                tracing::warn!("Ignoring malformed tag data {}", value);
                Vec::new()
            }
        }
    }
}

/// `deserialize_with` helper accepting any [`RawTags`] shape
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawTags::deserialize(deserializer)?.into_tags())
}

/// Decode a JSON-encoded tag array.
///
/// An empty string is an empty list. Anything that is not a JSON array of
/// strings is logged and treated as an empty list.
pub fn decode_tags(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(tags) => normalize_tags(tags),
        Err(e) => {
            tracing::warn!("Ignoring malformed tag data {:?}: {}", raw, e);
            Vec::new()
        }
    }
}

/// Trim tags, drop blanks and remove duplicates keeping first occurrence
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.into();
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}
