//! Setup - recurring event の冪等な登録
//!
//! 「すでに登録済みか？」というグローバル状態を、scheduler への問い合わせに
//! 置き換えています。何度呼んでも登録は一つだけです。

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::ScheduleError;
use crate::ports::{Clock, Recurrence, Scheduler};

/// Hook fired by the scheduler to run a sweep.
pub const EXPIRATION_HOOK: &str = "post_expiration_check";

/// What `ensure_scheduled` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// A registration existed; its next run is attached.
    AlreadyScheduled(DateTime<Utc>),
    /// A new registration was made, first running at the attached time.
    Scheduled(DateTime<Utc>),
}

/// Register `hook` with `recurrence` starting now, unless it is already registered.
pub async fn ensure_scheduled(
    scheduler: &dyn Scheduler,
    clock: &dyn Clock,
    hook: &str,
    recurrence: Recurrence,
) -> Result<SetupOutcome, ScheduleError> {
    if let Some(next_run) = scheduler.next_scheduled(hook).await? {
        debug!(hook, %next_run, "setup: already scheduled");
        return Ok(SetupOutcome::AlreadyScheduled(next_run));
    }

    let first_run = clock.now();
    scheduler
        .schedule_recurring(hook, first_run, recurrence)
        .await?;
    info!(hook, %recurrence, %first_run, "setup: scheduled");
    Ok(SetupOutcome::Scheduled(first_run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryScheduler;
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn registers_once() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        let scheduler = InMemoryScheduler::new();

        let first = ensure_scheduled(&scheduler, &clock, EXPIRATION_HOOK, Recurrence::Hourly)
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        let second = ensure_scheduled(&scheduler, &clock, EXPIRATION_HOOK, Recurrence::Hourly)
            .await
            .unwrap();

        assert_eq!(first, SetupOutcome::Scheduled(start));
        assert_eq!(second, SetupOutcome::AlreadyScheduled(start));

        let events = scheduler.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hook, EXPIRATION_HOOK);
        assert_eq!(events[0].recurrence, Recurrence::Hourly);
    }

    #[tokio::test]
    async fn other_hooks_do_not_count() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let scheduler = InMemoryScheduler::new();
        scheduler
            .schedule_recurring("something_else", clock.now(), Recurrence::Daily)
            .await
            .unwrap();

        let outcome = ensure_scheduled(&scheduler, &clock, EXPIRATION_HOOK, Recurrence::Hourly)
            .await
            .unwrap();

        assert!(matches!(outcome, SetupOutcome::Scheduled(_)));
        assert_eq!(scheduler.events().await.len(), 2);
    }
}
