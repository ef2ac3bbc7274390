//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryContentStore**: 開発用の content store
//! - **InMemoryScheduler**: プロセス内の recurring event 表
//! - **HashNonceVerifier**: SHA-256 ベースの token
//!
//! ホストの DB や cron に繋ぐ実装は別クレートに置く想定です。

pub mod memory_scheduler;
pub mod memory_store;
pub mod nonce;

pub use self::memory_scheduler::{InMemoryScheduler, ScheduledEvent};
pub use self::memory_store::InMemoryContentStore;
pub use self::nonce::HashNonceVerifier;
