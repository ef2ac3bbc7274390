//! In-memory content store.
//!
//! 開発・テスト用。CLI もこの実装に JSON から item を流し込んで使います。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ContentItem, ItemId, ItemQuery, ItemType, PublicationStatus, StatusCounts, StoreError,
};
use crate::ports::{Clock, ContentStore, IdGenerator, UlidGenerator};

/// In-memory store state.
struct InMemoryStoreState {
    /// All items (single source of truth).
    items: HashMap<ItemId, ContentItem>,
}

impl InMemoryStoreState {
    fn item_mut(&mut self, id: ItemId) -> Result<&mut ContentItem, StoreError> {
        self.items.get_mut(&id).ok_or(StoreError::NotFound(id))
    }
}

/// In-memory content store.
///
/// Design:
/// - One `tokio::sync::Mutex` around the whole map; every operation is a
///   single short critical section with no await inside.
/// - Writes stamp `modified_at` from the injected clock.
pub struct InMemoryContentStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl InMemoryContentStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_items(clock, Vec::<ContentItem>::new())
    }

    /// Store pre-seeded with `items`.
    pub fn with_items(clock: Arc<dyn Clock>, items: impl IntoIterator<Item = ContentItem>) -> Self {
        let items = items.into_iter().map(|item| (item.id, item)).collect();
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState { items })),
            ids: Box::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
        }
    }

    /// Create a new item with a generated id.
    pub async fn create(
        &self,
        item_type: ItemType,
        title: impl Into<String>,
        status: PublicationStatus,
    ) -> ContentItem {
        let item = ContentItem::new(
            self.ids.generate_item_id(),
            item_type,
            title,
            status,
            self.clock.now(),
        );
        self.state
            .lock()
            .await
            .items
            .insert(item.id, item.clone());
        item
    }

    /// Snapshot of every item, ordered by id.
    pub async fn all(&self) -> Vec<ContentItem> {
        let state = self.state.lock().await;
        let mut items: Vec<ContentItem> = state.items.values().cloned().collect();
        items.sort_by_key(|item| item.id);
        items
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn insert(&self, item: ContentItem) -> Result<(), StoreError> {
        self.state.lock().await.items.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, id: ItemId) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.state.lock().await.items.get(&id).cloned())
    }

    async fn query(&self, query: &ItemQuery) -> Result<Vec<ContentItem>, StoreError> {
        let state = self.state.lock().await;
        let mut matched: Vec<ContentItem> = state
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        drop(state);

        matched.sort_by_key(|item| item.id);
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn update_status(&self, id: ItemId, status: PublicationStatus) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let item = state.item_mut(id)?;
        item.status = status;
        item.modified_at = now;
        Ok(())
    }

    async fn update_meta(
        &self,
        id: ItemId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.item_mut(id)?.meta.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_meta(&self, id: ItemId, key: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.item_mut(id)?.meta.remove(key).is_some())
    }

    async fn counts_by_status(&self) -> Result<StatusCounts, StoreError> {
        let state = self.state.lock().await;
        let mut counts = StatusCounts::default();
        for item in state.items.values() {
            counts.record(item.status);
        }
        Ok(counts)
    }
}
