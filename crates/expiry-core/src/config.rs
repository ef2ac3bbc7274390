//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;

use crate::domain::{ConfigError, ItemType};
use crate::ports::Recurrence;

pub const ITEM_TYPE_VAR: &str = "EXPIRY_ITEM_TYPE";
pub const RECURRENCE_VAR: &str = "EXPIRY_RECURRENCE";
pub const POLL_SECONDS_VAR: &str = "EXPIRY_POLL_SECONDS";
pub const UTC_OFFSET_MINUTES_VAR: &str = "EXPIRY_UTC_OFFSET_MINUTES";
pub const NONCE_SECRET_VAR: &str = "EXPIRY_NONCE_SECRET";
pub const NONCE_LIFETIME_SECONDS_VAR: &str = "EXPIRY_NONCE_LIFETIME_SECONDS";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Item type the sweep looks at.
    pub item_type: ItemType,
    /// How often the sweep hook recurs.
    pub recurrence: Recurrence,
    /// How often the dispatch loop checks for due hooks.
    pub poll_interval: Duration,
    /// Site-local offset used to render "now".
    pub utc_offset: FixedOffset,
    pub nonce_secret: String,
    pub nonce_lifetime: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_type: ItemType::post(),
            recurrence: Recurrence::Hourly,
            poll_interval: Duration::from_secs(60),
            utc_offset: Utc.fix(),
            nonce_secret: "change-me".to_string(),
            nonce_lifetime: chrono::Duration::days(1),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ITEM_TYPE_VAR) {
            let value = value.trim();
            if value.is_empty() {
                return Err(invalid(ITEM_TYPE_VAR, value));
            }
            config.item_type = ItemType::new(value);
        }
        if let Some(value) = lookup(RECURRENCE_VAR) {
            config.recurrence = value
                .parse()
                .map_err(|_| invalid(RECURRENCE_VAR, &value))?;
        }
        if let Some(value) = lookup(POLL_SECONDS_VAR) {
            let secs: u64 = value
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid(POLL_SECONDS_VAR, &value))?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(value) = lookup(UTC_OFFSET_MINUTES_VAR) {
            config.utc_offset = value
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|minutes| minutes.checked_mul(60))
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| invalid(UTC_OFFSET_MINUTES_VAR, &value))?;
        }
        if let Some(value) = lookup(NONCE_SECRET_VAR) {
            if value.is_empty() {
                return Err(invalid(NONCE_SECRET_VAR, &value));
            }
            config.nonce_secret = value;
        }
        if let Some(value) = lookup(NONCE_LIFETIME_SECONDS_VAR) {
            config.nonce_lifetime = value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs >= 2)
                .and_then(chrono::Duration::try_seconds)
                .ok_or_else(|| invalid(NONCE_LIFETIME_SECONDS_VAR, &value))?;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
