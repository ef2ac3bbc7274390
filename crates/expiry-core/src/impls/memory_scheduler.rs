//! InMemoryScheduler - プロセス内の recurring event 表
//!
//! # 学習ポイント
//! - 登録は hook 名 + 次回実行時刻 + 間隔だけ（handler は持たない）
//! - 遅れて実行された場合は「元の時刻の格子」に揃えて次回を決める

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::ScheduleError;
use crate::ports::{Recurrence, Scheduler};

/// One recurring registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub hook: String,
    pub next_run: DateTime<Utc>,
    pub recurrence: Recurrence,
}

impl ScheduledEvent {
    /// Advance after a run at `now`.
    ///
    /// The next run stays on the grid of the original schedule:
    /// `now + (interval - (now - next_run) % interval)`, which is at least one
    /// second and at most one interval away.
    fn reschedule(&mut self, now: DateTime<Utc>) {
        let step = self.recurrence.interval().num_seconds().max(1);
        let behind = (now - self.next_run).num_seconds().max(0);
        self.next_run = now
            .checked_add_signed(Duration::seconds(step - behind % step))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

/// InMemoryScheduler は開発用の scheduler
///
/// # 実装詳細
/// - `Vec<ScheduledEvent>` を Mutex で保護
/// - 同じ hook の二重登録は許す（重複防止は setup の責任）
#[derive(Default)]
pub struct InMemoryScheduler {
    events: Arc<Mutex<Vec<ScheduledEvent>>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the registration table, earliest first.
    pub async fn events(&self) -> Vec<ScheduledEvent> {
        let mut events = self.events.lock().await.clone();
        events.sort_by_key(|event| event.next_run);
        events
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn next_scheduled(&self, hook: &str) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|event| event.hook == hook)
            .map(|event| event.next_run)
            .min())
    }

    async fn schedule_recurring(
        &self,
        hook: &str,
        first_run: DateTime<Utc>,
        recurrence: Recurrence,
    ) -> Result<(), ScheduleError> {
        if recurrence.interval() <= Duration::zero() {
            return Err(ScheduleError::InvalidRecurrence(recurrence.to_string()));
        }
        self.events.lock().await.push(ScheduledEvent {
            hook: hook.to_string(),
            next_run: first_run,
            recurrence,
        });
        Ok(())
    }

    async fn unschedule(&self, hook: &str) -> Result<usize, ScheduleError> {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|event| event.hook != hook);
        Ok(before - events.len())
    }

    async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<String>, ScheduleError> {
        let mut events = self.events.lock().await;
        let mut due: Vec<(DateTime<Utc>, String)> = Vec::new();
        for event in events.iter_mut().filter(|event| event.next_run <= now) {
            due.push((event.next_run, event.hook.clone()));
            event.reschedule(now);
        }
        due.sort_by_key(|(at, _)| *at);
        Ok(due.into_iter().map(|(_, hook)| hook).collect())
    }
}
