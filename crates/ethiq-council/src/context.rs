//! Moderation requests and their open-ended context bag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Number of characters kept in a [`RequestPreview`].
pub const PREVIEW_CHARS: usize = 100;

/// Key-value context accompanying a piece of content.
///
/// Unrecognized keys are preserved. Every typed accessor tolerates a missing
/// or wrongly-typed key by returning `None` or `false`; analyzers document
/// their own defaults on top of that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModerationContext(Map<String, Value>);

impl ModerationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON value. Non-object values yield an
    /// empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Sets an arbitrary key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Sets `audience_size`.
    pub fn with_audience_size(self, size: u64) -> Self {
        self.with("audience_size", size)
    }

    /// Sets `vulnerable_audience`.
    pub fn with_vulnerable_audience(self, vulnerable: bool) -> Self {
        self.with("vulnerable_audience", vulnerable)
    }

    /// Sets `educational_value`.
    pub fn with_educational_value(self, educational: bool) -> Self {
        self.with("educational_value", educational)
    }

    /// Sets `public_interest`.
    pub fn with_public_interest(self, public_interest: bool) -> Self {
        self.with("public_interest", public_interest)
    }

    /// Sets `target_cultures`.
    pub fn with_target_cultures<I, S>(self, cultures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<Value> = cultures
            .into_iter()
            .map(|c| Value::String(c.into()))
            .collect();
        self.with("target_cultures", Value::Array(list))
    }

    /// Sets `platform`.
    pub fn with_platform(self, platform: impl Into<String>) -> Self {
        self.with("platform", platform.into())
    }

    /// Raw access to any key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of keys, recognized or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no keys are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a boolean flag; absent or non-boolean keys are `None`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Expected audience size. Only positive integers are recognized.
    pub fn audience_size(&self) -> Option<u64> {
        self.0
            .get("audience_size")
            .and_then(Value::as_u64)
            .filter(|size| *size > 0)
    }

    /// Whether the audience includes vulnerable people.
    pub fn vulnerable_audience(&self) -> bool {
        self.flag("vulnerable_audience").unwrap_or(false)
    }

    /// Whether the content carries educational value.
    pub fn educational_value(&self) -> bool {
        self.flag("educational_value").unwrap_or(false)
    }

    /// Whether the content is in the public interest.
    pub fn public_interest(&self) -> bool {
        self.flag("public_interest").unwrap_or(false)
    }

    /// Whether the content contributes to democratic discourse.
    pub fn democratic_value(&self) -> bool {
        self.flag("democratic_value").unwrap_or(false)
    }

    /// Whether the content is posted on a public platform, if stated.
    pub fn public_platform(&self) -> Option<bool> {
        self.flag("public_platform")
    }

    /// Cultures the content is aimed at. Accepts a list or a single string.
    pub fn target_cultures(&self) -> Option<BTreeSet<String>> {
        match self.0.get("target_cultures")? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.to_lowercase())
                    .collect(),
            ),
            Value::String(single) => Some(BTreeSet::from([single.to_lowercase()])),
            _ => None,
        }
    }

    /// Platform the content was posted on.
    pub fn platform(&self) -> Option<&str> {
        self.0.get("platform").and_then(Value::as_str)
    }

    /// Media type of the content, e.g. `text` or `video`.
    pub fn content_type(&self) -> Option<&str> {
        self.0.get("content_type").and_then(Value::as_str)
    }

    /// Consumes the context and returns the underlying JSON map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// One unit of work for the council.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// The content under review, treated as opaque text.
    pub content: String,
    /// Context accompanying the content.
    pub context: ModerationContext,
}

impl ModerationRequest {
    /// Creates a request.
    pub fn new(content: impl Into<String>, context: ModerationContext) -> Self {
        Self {
            content: content.into(),
            context,
        }
    }

    /// Builds the redacted form kept in deliberation history.
    pub fn preview(&self) -> RequestPreview {
        RequestPreview::of(self)
    }
}

/// Redacted view of a request: truncated content plus a digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPreview {
    /// First [`PREVIEW_CHARS`] characters, with `...` appended if cut.
    pub content_preview: String,
    /// Hex-encoded SHA-256 of the full content.
    pub content_digest: String,
    /// Length of the full content in characters.
    pub content_chars: usize,
    /// The full context.
    pub context: ModerationContext,
}

impl RequestPreview {
    /// Builds a preview of `request`.
    pub fn of(request: &ModerationRequest) -> Self {
        let content_chars = request.content.chars().count();
        let content_preview = if content_chars > PREVIEW_CHARS {
            let head: String = request.content.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            request.content.clone()
        };

        Self {
            content_preview,
            content_digest: hex::encode(Sha256::digest(request.content.as_bytes())),
            content_chars,
            context: request.context.clone(),
        }
    }
}
