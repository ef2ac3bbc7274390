//! Domain model (IDs, items, status, expiration, queries, errors).

pub mod errors;
pub mod expiration;
pub mod ids;
pub mod item;
pub mod query;
pub mod status;

pub use self::errors::{ConfigError, ExpiryError, HookError, ScheduleError, StoreError};
pub use self::expiration::{EXPIRATION_META_KEY, EXPIRED_META_KEY};
pub use self::ids::{ItemId, Id, IdMarker};
pub use self::item::{ContentItem, ItemType, MetaMap};
pub use self::query::{Compare, ItemQuery, MetaClause, MetaType};
pub use self::status::{PublicationStatus, StatusCounts};
