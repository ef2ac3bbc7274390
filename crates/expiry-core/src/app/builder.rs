//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 省略された collaborator は開発用の実装で埋める

use std::sync::Arc;

use crate::app::dispatch::{DispatchHandle, Dispatcher};
use crate::app::editor::ExpirationEditor;
use crate::app::hooks::{HookHandler, HookRegistry};
use crate::app::setup::{EXPIRATION_HOOK, SetupOutcome, ensure_scheduled};
use crate::app::sweeper::ExpirationSweeper;
use crate::config::Config;
use crate::domain::{HookError, ScheduleError};
use crate::impls::{HashNonceVerifier, InMemoryContentStore, InMemoryScheduler};
use crate::ports::{Clock, ContentStore, NonceVerifier, Scheduler, SystemClock};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(Config::from_env()?)
///     .store(store)
///     .expect_hooks(&[EXPIRATION_HOOK])
///     .build()?;
/// app.activate().await?;
/// ```
///
/// # Fail-fast 設計
/// - build() は sweeper を `EXPIRATION_HOOK` に自動登録する
/// - expect_hooks() で期待される hook を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
pub struct AppBuilder {
    config: Config,
    store: Option<Arc<dyn ContentStore>>,
    clock: Option<Arc<dyn Clock>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    nonces: Option<Arc<dyn NonceVerifier>>,
    extra_hooks: Vec<(String, Arc<dyn HookHandler>)>,
    expected_hooks: Option<Vec<String>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing hooks: {0:?}. These hooks were expected but have no handler.")]
    MissingHooks(Vec<String>),

    #[error(transparent)]
    Hook(#[from] HookError),
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            clock: None,
            scheduler: None,
            nonces: None,
            extra_hooks: Vec::new(),
            expected_hooks: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn nonces(mut self, nonces: Arc<dyn NonceVerifier>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Register an additional hook handler.
    pub fn hook(mut self, hook: impl Into<String>, handler: Arc<dyn HookHandler>) -> Self {
        self.extra_hooks.push((hook.into(), handler));
        self
    }

    /// 期待される hook のリストを設定
    pub fn expect_hooks(mut self, hooks: &[&str]) -> Self {
        self.expected_hooks = Some(hooks.iter().map(|hook| hook.to_string()).collect());
        self
    }

    /// # 検証
    /// - hook の二重登録は `BuildError::Hook`
    /// - expect_hooks() の hook に handler が無ければ `BuildError::MissingHooks`
    pub fn build(self) -> Result<App, BuildError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryContentStore::new(Arc::clone(&clock))));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(InMemoryScheduler::new()));
        let nonces = self.nonces.unwrap_or_else(|| {
            Arc::new(HashNonceVerifier::new(
                self.config.nonce_secret.clone(),
                Arc::clone(&clock),
                self.config.nonce_lifetime,
            ))
        });

        let sweeper = Arc::new(
            ExpirationSweeper::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                self.config.item_type.clone(),
            )
            .with_utc_offset(self.config.utc_offset),
        );

        let mut registry = HookRegistry::new();
        registry.register(EXPIRATION_HOOK, sweeper.clone())?;
        for (hook, handler) in self.extra_hooks {
            registry.register(hook, handler)?;
        }

        if let Some(expected_hooks) = &self.expected_hooks {
            let missing: Vec<String> = expected_hooks
                .iter()
                .filter(|hook| !registry.contains(hook))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingHooks(missing));
            }
        }

        let editor = ExpirationEditor::new(Arc::clone(&store), nonces);

        Ok(App {
            config: self.config,
            store,
            clock,
            scheduler,
            registry: Arc::new(registry),
            sweeper,
            editor,
        })
    }
}

/// App は組み立て済みの collaborator 一式
pub struct App {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<dyn Scheduler>,
    pub registry: Arc<HookRegistry>,
    pub sweeper: Arc<ExpirationSweeper>,
    pub editor: ExpirationEditor,
}

impl App {
    /// Make sure the sweep hook recurs. Safe to call on every start.
    pub async fn activate(&self) -> Result<SetupOutcome, ScheduleError> {
        ensure_scheduled(
            self.scheduler.as_ref(),
            self.clock.as_ref(),
            EXPIRATION_HOOK,
            self.config.recurrence,
        )
        .await
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.registry),
            Arc::clone(&self.clock),
        )
    }

    /// Start the background dispatch loop at the configured poll interval.
    pub fn spawn_dispatcher(&self) -> DispatchHandle {
        Arc::new(self.dispatcher()).spawn(self.config.poll_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExpiryError;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl HookHandler for NoopHandler {
        async fn fire(&self) -> Result<(), ExpiryError> {
            Ok(())
        }
    }

    #[test]
    fn test_build_registers_sweeper() {
        let app = AppBuilder::new(Config::default())
            .expect_hooks(&[EXPIRATION_HOOK])
            .build()
            .unwrap();
        assert_eq!(app.registry.hooks(), vec![EXPIRATION_HOOK.to_string()]);
    }

    #[test]
    fn test_build_missing_hooks() {
        let app = AppBuilder::new(Config::default())
            .expect_hooks(&[EXPIRATION_HOOK, "digest_mail"])
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingHooks(missing)) if missing == vec!["digest_mail".to_string()]
        ));
    }

    #[test]
    fn test_build_with_extra_hook() {
        let app = AppBuilder::new(Config::default())
            .hook("digest_mail", Arc::new(NoopHandler))
            .expect_hooks(&[EXPIRATION_HOOK, "digest_mail"])
            .build();
        assert!(app.is_ok());
    }

    #[test]
    fn test_build_rejects_second_sweep_handler() {
        let app = AppBuilder::new(Config::default())
            .hook(EXPIRATION_HOOK, Arc::new(NoopHandler))
            .build();
        assert!(matches!(
            app,
            Err(BuildError::Hook(HookError::DuplicateHandler(hook))) if hook == EXPIRATION_HOOK
        ));
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let app = AppBuilder::new(Config::default()).build().unwrap();

        let first = app.activate().await.unwrap();
        let second = app.activate().await.unwrap();

        assert!(matches!(first, SetupOutcome::Scheduled(_)));
        assert!(matches!(second, SetupOutcome::AlreadyScheduled(_)));
    }
}
