//! Expiration attribute: meta keys and date-time reading.
//!
//! The editor stores the submitted value verbatim (`2024-01-01T09:30`), so the
//! reader has to accept several layouts. Anything it cannot read is treated as
//! "no expiration".

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Meta key holding the expiration text.
pub const EXPIRATION_META_KEY: &str = "_expiration_date";

/// Meta key set to `true` once the sweep has drafted an item.
pub const EXPIRED_META_KEY: &str = "_expired";

/// Normalized layout used for "now" in store comparisons.
pub const NORMALIZED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout written by the editor's datetime-local field.
pub const EDITOR_FORMAT: &str = "%Y-%m-%dT%H:%M";

const DATETIME_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    EDITOR_FORMAT,
    NORMALIZED_FORMAT,
    "%Y-%m-%d %H:%M",
];

/// Read an expiration value as a naive site-local date-time.
///
/// Returns `None` for empty or unreadable input.
pub fn parse_expiration(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Convert an instant to site-local wall-clock time.
pub fn site_local(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    now.with_timezone(&offset).naive_local()
}

/// `Y-m-d H:i:s` rendering of a local date-time.
pub fn normalize(local: NaiveDateTime) -> String {
    local.format(NORMALIZED_FORMAT).to_string()
}

/// Has an expiration value been reached at `now`? Inclusive.
pub fn is_expired(raw: &str, now: NaiveDateTime) -> bool {
    parse_expiration(raw).is_some_and(|at| at <= now)
}
