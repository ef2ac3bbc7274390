//! Dispatcher - due になった hook を handler に渡すループ
//!
//! # フロー
//! 1. 一定間隔（poll interval）で起きる
//! 2. Scheduler::take_due(now) で実行すべき hook 名を取得
//! 3. HookRegistry::fire() で順番に実行（並列にはしない）
//! 4. handler の失敗はログに残すだけ（リトライしない）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::app::hooks::HookRegistry;
use crate::app::status::TickReport;
use crate::domain::ScheduleError;
use crate::ports::{Clock, Scheduler};

pub struct Dispatcher {
    scheduler: Arc<dyn Scheduler>,
    registry: Arc<HookRegistry>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        registry: Arc<HookRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scheduler,
            registry,
            clock,
        }
    }

    /// Fire every hook that is due now.
    ///
    /// Hooks run one after another, so a sweep never overlaps another sweep
    /// started by this dispatcher.
    pub async fn tick(&self) -> Result<TickReport, ScheduleError> {
        let due = self.scheduler.take_due(self.clock.now()).await?;
        let mut report = TickReport::default();
        for hook in due {
            match self.registry.fire(&hook).await {
                Ok(()) => report.fired += 1,
                Err(e) => {
                    error!(hook = %hook, error = %e, "dispatch: hook failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Run `tick()` every `poll_interval` on a background task.
    pub fn spawn(self: Arc<Self>, poll_interval: Duration) -> DispatchHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(?poll_interval, "dispatch: started");

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        // sender dropped: nobody can stop us any more, so stop now
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                    _ = interval.tick() => {}
                }

                if let Err(e) = self.tick().await {
                    warn!(error = %e, "dispatch: could not read due hooks");
                }
            }

            info!("dispatch: stopped");
        });

        DispatchHandle { shutdown_tx, join }
    }
}

/// Handle to a running dispatch loop.
/// - `request_shutdown()` でループを止める（実行中の hook は最後まで走る）
/// - `shutdown_and_join()` で終了を待つ
pub struct DispatchHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DispatchHandle {
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns `false` if the loop died (a handler panicked) instead of stopping.
    pub async fn shutdown_and_join(self) -> bool {
        self.request_shutdown();
        match self.join.await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "dispatch: loop ended abnormally");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::hooks::HookHandler;
    use crate::domain::{ExpiryError, StoreError};
    use crate::impls::InMemoryScheduler;
    use crate::ports::{FixedClock, Recurrence};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        fired: AtomicUsize,
    }

    #[async_trait]
    impl HookHandler for CountingHandler {
        async fn fire(&self) -> Result<(), ExpiryError> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl HookHandler for FailingHandler {
        async fn fire(&self) -> Result<(), ExpiryError> {
            Err(StoreError::Unavailable("down".to_string()).into())
        }
    }

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn tick_fires_due_hooks_once_per_interval() {
        let clock = clock();
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler
            .schedule_recurring("tick", clock.now(), Recurrence::Hourly)
            .await
            .unwrap();
        let handler = Arc::new(CountingHandler::default());
        let mut registry = HookRegistry::new();
        registry.register("tick", handler.clone()).unwrap();
        let dispatcher = Dispatcher::new(scheduler, Arc::new(registry), Arc::new(clock.clone()));

        assert_eq!(dispatcher.tick().await.unwrap(), TickReport { fired: 1, failed: 0 });
        assert_eq!(dispatcher.tick().await.unwrap(), TickReport::default());

        clock.advance(chrono::Duration::hours(1));
        dispatcher.tick().await.unwrap();
        assert_eq!(handler.fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_and_unknown_hooks_are_counted() {
        let clock = clock();
        let scheduler = Arc::new(InMemoryScheduler::new());
        for hook in ["broken", "unknown"] {
            scheduler
                .schedule_recurring(hook, clock.now(), Recurrence::Hourly)
                .await
                .unwrap();
        }
        let mut registry = HookRegistry::new();
        registry.register("broken", Arc::new(FailingHandler)).unwrap();
        let dispatcher = Dispatcher::new(scheduler, Arc::new(registry), Arc::new(clock));

        let report = dispatcher.tick().await.unwrap();
        assert_eq!(report, TickReport { fired: 0, failed: 2 });
    }

    #[tokio::test]
    async fn spawned_loop_fires_and_shuts_down() {
        let clock = clock();
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler
            .schedule_recurring("tick", clock.now(), Recurrence::Hourly)
            .await
            .unwrap();
        let handler = Arc::new(CountingHandler::default());
        let mut registry = HookRegistry::new();
        registry.register("tick", handler.clone()).unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            scheduler,
            Arc::new(registry),
            Arc::new(clock),
        ));

        let handle = dispatcher.spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.shutdown_and_join().await);

        // The fixed clock never moves, so the hourly hook fires exactly once.
        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
    }

    struct PanickingHandler;

    #[async_trait]
    impl HookHandler for PanickingHandler {
        async fn fire(&self) -> Result<(), ExpiryError> {
            panic!("handler blew up");
        }
    }

    #[tokio::test]
    async fn panicked_loop_is_reported_on_join() {
        let clock = clock();
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler
            .schedule_recurring("boom", clock.now(), Recurrence::Hourly)
            .await
            .unwrap();
        let mut registry = HookRegistry::new();
        registry.register("boom", Arc::new(PanickingHandler)).unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            scheduler,
            Arc::new(registry),
            Arc::new(clock),
        ));

        let handle = dispatcher.spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!handle.shutdown_and_join().await);
    }
}
