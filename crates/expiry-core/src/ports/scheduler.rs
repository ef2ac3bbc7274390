//! Scheduler port - 定期実行の登録
//!
//! ホストの「recurring event」に相当します。登録の重複チェックはしないので、
//! 二重登録を避けるのは呼び出し側（`app::setup::ensure_scheduled`）の責任です。

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ScheduleError;

/// Recurrence は実行間隔
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    Hourly,
    TwiceDaily,
    Daily,
    Weekly,
    /// Custom interval in seconds (must be > 0).
    Every(u64),
}

impl Recurrence {
    pub fn interval(self) -> Duration {
        match self {
            Recurrence::Hourly => Duration::hours(1),
            Recurrence::TwiceDaily => Duration::hours(12),
            Recurrence::Daily => Duration::days(1),
            Recurrence::Weekly => Duration::weeks(1),
            Recurrence::Every(secs) => i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Hourly => f.write_str("hourly"),
            Recurrence::TwiceDaily => f.write_str("twicedaily"),
            Recurrence::Daily => f.write_str("daily"),
            Recurrence::Weekly => f.write_str("weekly"),
            Recurrence::Every(secs) => write!(f, "{secs}"),
        }
    }
}

impl FromStr for Recurrence {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Recurrence::Hourly),
            "twicedaily" => Ok(Recurrence::TwiceDaily),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            other => match other.parse::<u64>() {
                Ok(secs) if secs > 0 && representable(secs) => Ok(Recurrence::Every(secs)),
                _ => Err(ScheduleError::InvalidRecurrence(s.to_string())),
            },
        }
    }
}

fn representable(secs: u64) -> bool {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .is_some()
}

/// Scheduler は hook 名に対して定期実行を登録
///
/// # 設計原則
/// - hook 名だけを知っていて、handler は知らない（dispatch は `app::hooks`）
/// - 同じ hook を二度登録すれば二度走る（ホストの挙動と同じ）
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Earliest pending run of `hook`, if registered.
    async fn next_scheduled(&self, hook: &str) -> Result<Option<DateTime<Utc>>, ScheduleError>;

    async fn schedule_recurring(
        &self,
        hook: &str,
        first_run: DateTime<Utc>,
        recurrence: Recurrence,
    ) -> Result<(), ScheduleError>;

    /// Remove every registration of `hook`; returns how many were removed.
    async fn unschedule(&self, hook: &str) -> Result<usize, ScheduleError>;

    /// Hooks whose next run is at or before `now`, in run order.
    ///
    /// Each returned registration is advanced to its next run before this
    /// returns, so a hook is handed out at most once per due time.
    async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<String>, ScheduleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::hourly("hourly", Recurrence::Hourly, 3600)]
    #[case::twice_daily("twicedaily", Recurrence::TwiceDaily, 43_200)]
    #[case::daily(" Daily ", Recurrence::Daily, 86_400)]
    #[case::weekly("weekly", Recurrence::Weekly, 604_800)]
    #[case::seconds("90", Recurrence::Every(90), 90)]
    fn parses_recurrence(#[case] raw: &str, #[case] expected: Recurrence, #[case] secs: i64) {
        let parsed: Recurrence = raw.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.interval().num_seconds(), secs);
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-5")]
    #[case::unknown("fortnightly")]
    #[case::too_long("9223372036854775807")]
    #[case::past_u64("18446744073709551616")]
    fn rejects_bad_recurrence(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<Recurrence>(),
            Err(ScheduleError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn oversized_custom_interval_saturates() {
        assert_eq!(Recurrence::Every(u64::MAX).interval(), Duration::MAX);
    }

    #[test]
    fn display_roundtrips_names() {
        for r in [Recurrence::Hourly, Recurrence::TwiceDaily, Recurrence::Every(30)] {
            assert_eq!(r.to_string().parse::<Recurrence>().unwrap(), r);
        }
    }
}
