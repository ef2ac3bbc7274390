//! Item query model: type filter + meta clauses.
//!
//! Stores translate an [`ItemQuery`] into whatever they speak natively. The
//! in-memory store evaluates it directly with [`ItemQuery::matches`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::expiration::parse_expiration;
use super::item::{ContentItem, ItemType, MetaMap, meta_value_text};
use super::status::PublicationStatus;

/// Comparison operator of a meta clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "EXISTS")]
    Exists,
    #[serde(rename = "NOT EXISTS")]
    NotExists,
}

impl Compare {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Compare::Eq => ordering == Ordering::Equal,
            Compare::Ne => ordering != Ordering::Equal,
            Compare::Lt => ordering == Ordering::Less,
            Compare::Le => ordering != Ordering::Greater,
            Compare::Gt => ordering == Ordering::Greater,
            Compare::Ge => ordering != Ordering::Less,
            Compare::Exists | Compare::NotExists => false,
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Compare::Eq => "=",
            Compare::Ne => "!=",
            Compare::Lt => "<",
            Compare::Le => "<=",
            Compare::Gt => ">",
            Compare::Ge => ">=",
            Compare::Exists => "EXISTS",
            Compare::NotExists => "NOT EXISTS",
        };
        f.write_str(op)
    }
}

/// How the meta text is cast before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetaType {
    /// Plain text, byte-wise lexicographic.
    #[default]
    Char,
    /// Date-time; unreadable values behave like NULL.
    DateTime,
    /// Floating point; unreadable values behave like NULL.
    Numeric,
}

/// One `key <op> value` condition on item metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaClause {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub compare: Compare,
    #[serde(default, rename = "type")]
    pub value_type: MetaType,
}

impl MetaClause {
    pub fn new(
        key: impl Into<String>,
        compare: Compare,
        value: impl Into<String>,
        value_type: MetaType,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            compare,
            value_type,
        }
    }

    pub fn exists(key: impl Into<String>) -> Self {
        Self::new(key, Compare::Exists, "", MetaType::Char)
    }

    pub fn not_exists(key: impl Into<String>) -> Self {
        Self::new(key, Compare::NotExists, "", MetaType::Char)
    }

    /// Evaluate against an item's metadata.
    ///
    /// A missing key never satisfies a comparison, and neither does a value
    /// that cannot be cast to `value_type` (SQL NULL semantics).
    pub fn matches(&self, meta: &MetaMap) -> bool {
        let stored = meta.get(&self.key);
        match self.compare {
            Compare::Exists => return stored.is_some(),
            Compare::NotExists => return stored.is_none(),
            _ => {}
        }
        let Some(text) = stored.and_then(meta_value_text) else {
            return false;
        };
        self.compare_text(&text)
            .is_some_and(|ordering| self.compare.accepts(ordering))
    }

    fn compare_text(&self, stored: &str) -> Option<Ordering> {
        match self.value_type {
            MetaType::Char => Some(stored.cmp(self.value.as_str())),
            MetaType::DateTime => {
                let left: NaiveDateTime = parse_expiration(stored)?;
                let right: NaiveDateTime = parse_expiration(&self.value)?;
                Some(left.cmp(&right))
            }
            MetaType::Numeric => {
                let left: f64 = stored.trim().parse().ok()?;
                let right: f64 = self.value.trim().parse().ok()?;
                left.partial_cmp(&right)
            }
        }
    }
}

/// Query over content items. All conditions are AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub item_type: ItemType,

    /// Restrict to these statuses; `None` means any status.
    #[serde(default)]
    pub statuses: Option<Vec<PublicationStatus>>,

    #[serde(default)]
    pub meta: Vec<MetaClause>,

    /// Maximum number of items; `None` means unbounded.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ItemQuery {
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            statuses: None,
            meta: Vec::new(),
            limit: None,
        }
    }

    pub fn with_meta(mut self, clause: MetaClause) -> Self {
        self.meta.push(clause);
        self
    }

    pub fn with_statuses(mut self, statuses: &[PublicationStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        if item.item_type != self.item_type {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&item.status) {
                return false;
            }
        }
        self.meta.iter().all(|clause| clause.matches(&item.meta))
    }
}
