use crate::{error::Result, models::HistoryItem, storage::traits::HistoryStore};
use async_trait::async_trait;
use std::cmp::Reverse;
use tokio::sync::RwLock;

/// Process-local history, lost on restart.
#[derive(Default)]
pub struct MemoryHistoryStore {
    items: RwLock<Vec<HistoryItem>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert_batch(&self, items: Vec<HistoryItem>) -> Result<usize> {
        let count = items.len();
        self.items.write().await.extend(items);
        Ok(count)
    }

    async fn list(&self, collection_id: &str, limit: usize) -> Result<Vec<HistoryItem>> {
        let items = self.items.read().await;
        let mut matching: Vec<HistoryItem> = items
            .iter()
            .filter(|item| item.collection_id == collection_id)
            .cloned()
            .collect();

        matching.sort_by_key(|item| Reverse((item.created_at, item.id.clone())));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
