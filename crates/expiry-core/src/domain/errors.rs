//! Errors - エラー型
//!
//! ports ごとにエラー型を分け、アプリ層では [`ExpiryError`] に集約します。
//! sweep が返すのは query の失敗だけで、個々の書き込み失敗はログに残して続行します。

use thiserror::Error;

use super::ids::ItemId;

/// ContentStore の操作エラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content item not found: {0}")]
    NotFound(ItemId),

    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

/// Scheduler の操作エラー
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Hook 登録・ディスパッチのエラー
#[derive(Debug, Error)]
pub enum HookError {
    #[error("duplicate handler for hook={0}")]
    DuplicateHandler(String),

    #[error("handler not found for hook={0}")]
    HandlerNotFound(String),
}

/// 設定値の読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// ExpiryError はアプリ層の集約エラー
#[derive(Debug, Error)]
pub enum ExpiryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
