//! Tag normalization shared by every write path.

use serde::{Deserialize, Serialize};

/// Tags as submitted by a client: either `"a, b, c"` or `["a", "b", "c"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    Delimited(String),
    List(Vec<String>),
}

impl TagInput {
    /// Split, trim and drop empty entries. Order and duplicates are kept.
    ///
    /// Only the delimited form is split on commas; list elements are taken
    /// as whole tags.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagInput::Delimited(raw) => normalize_tags(raw.split(',')),
            TagInput::List(items) => normalize_tags(items),
        }
    }
}

impl Default for TagInput {
    fn default() -> Self {
        TagInput::List(Vec::new())
    }
}

impl From<&str> for TagInput {
    fn from(raw: &str) -> Self {
        TagInput::Delimited(raw.to_string())
    }
}

impl From<String> for TagInput {
    fn from(raw: String) -> Self {
        TagInput::Delimited(raw)
    }
}

impl From<Vec<String>> for TagInput {
    fn from(items: Vec<String>) -> Self {
        TagInput::List(items)
    }
}

pub fn normalize_tags<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
