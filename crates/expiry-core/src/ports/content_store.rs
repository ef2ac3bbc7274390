//! ContentStore port - item と metadata の正本（source of truth）
//!
//! sweeper と editor はこの trait だけを通して読み書きします。
//!
//! # 実装
//! - **InMemoryContentStore**（`impls::memory_store`）: 開発・テスト用
//! - 本番ではホスト側の DB に合わせた実装を別クレートに置く想定

use async_trait::async_trait;

use crate::domain::{ContentItem, ItemId, ItemQuery, PublicationStatus, StatusCounts, StoreError};

/// ContentStore は content item の永続化を担当
///
/// # 設計原則
/// - 一貫性の保証はストア側の責任（sweeper はトランザクションを張らない）
/// - 失敗時のリトライもしない（呼び出し側へ返すだけ）
/// - `query` の `limit: None` は件数無制限
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert or replace an item.
    async fn insert(&self, item: ContentItem) -> Result<(), StoreError>;

    async fn get(&self, id: ItemId) -> Result<Option<ContentItem>, StoreError>;

    /// Items matching the query, ordered by id.
    async fn query(&self, query: &ItemQuery) -> Result<Vec<ContentItem>, StoreError>;

    async fn update_status(&self, id: ItemId, status: PublicationStatus) -> Result<(), StoreError>;

    async fn update_meta(
        &self,
        id: ItemId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Returns whether the key was present.
    async fn delete_meta(&self, id: ItemId, key: &str) -> Result<bool, StoreError>;

    /// Observability hook.
    async fn counts_by_status(&self) -> Result<StatusCounts, StoreError>;
}
