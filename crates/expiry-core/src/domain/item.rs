//! Content item record: status + metadata.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiration::{EXPIRATION_META_KEY, EXPIRED_META_KEY};
use super::ids::ItemId;
use super::status::PublicationStatus;

/// Metadata map attached to an item.
pub type MetaMap = BTreeMap<String, serde_json::Value>;

/// Content type name (`post`, `page`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemType(String);

impl ItemType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn post() -> Self {
        Self::new("post")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A content item as held by the store.
///
/// Design:
/// - The store is the single source of truth; the sweeper only sees copies.
/// - Mutations go through the store port, never through a shared reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub item_type: ItemType,
    #[serde(default)]
    pub title: String,
    pub status: PublicationStatus,
    #[serde(default)]
    pub meta: MetaMap,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(
        id: ItemId,
        item_type: ItemType,
        title: impl Into<String>,
        status: PublicationStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_type,
            title: title.into(),
            status,
            meta: MetaMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Builder-style meta setter, handy for seeding.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Meta value rendered as text, the way the host stores it.
    ///
    /// Non-string scalars are stringified; `null`, arrays and objects yield `None`.
    pub fn meta_text(&self, key: &str) -> Option<String> {
        self.meta.get(key).and_then(meta_value_text)
    }

    /// Raw expiration text, if any.
    pub fn expiration(&self) -> Option<String> {
        self.meta_text(EXPIRATION_META_KEY)
    }

    /// Has the sweep marked this item?
    pub fn is_marked_expired(&self) -> bool {
        matches!(self.meta.get(EXPIRED_META_KEY), Some(serde_json::Value::Bool(true)))
    }
}

/// Text form of a stored meta value (`true` reads as "1", `false` as "").
pub(crate) fn meta_value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(if *b { "1" } else { "" }.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
