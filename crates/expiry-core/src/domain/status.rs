//! Publication status of a content item.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication status (the host's post_status values).
///
/// Only `Draft` is ever written by the sweep; the other states are carried
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    /// Publicly visible.
    Publish,

    /// Scheduled for future publication.
    Future,

    /// Unpublished, editable.
    Draft,

    /// Awaiting review.
    Pending,

    /// Visible to privileged users only.
    Private,

    /// In the trash.
    Trash,
}

impl PublicationStatus {
    pub const ALL: [PublicationStatus; 6] = [
        PublicationStatus::Publish,
        PublicationStatus::Future,
        PublicationStatus::Draft,
        PublicationStatus::Pending,
        PublicationStatus::Private,
        PublicationStatus::Trash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PublicationStatus::Publish => "publish",
            PublicationStatus::Future => "future",
            PublicationStatus::Draft => "draft",
            PublicationStatus::Pending => "pending",
            PublicationStatus::Private => "private",
            PublicationStatus::Trash => "trash",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown publication status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for PublicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Item counts per status (observability view).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub publish: usize,
    pub future: usize,
    pub draft: usize,
    pub pending: usize,
    pub private: usize,
    pub trash: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: PublicationStatus) {
        match status {
            PublicationStatus::Publish => self.publish += 1,
            PublicationStatus::Future => self.future += 1,
            PublicationStatus::Draft => self.draft += 1,
            PublicationStatus::Pending => self.pending += 1,
            PublicationStatus::Private => self.private += 1,
            PublicationStatus::Trash => self.trash += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.publish + self.future + self.draft + self.pending + self.private + self.trash
    }
}
