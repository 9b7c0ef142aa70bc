use crate::{error::Result, models::HistoryItem};
use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persists the whole batch as one statement.
    async fn insert_batch(&self, items: Vec<HistoryItem>) -> Result<usize>;

    /// Most recent items first, at most `limit`.
    async fn list(&self, collection_id: &str, limit: usize) -> Result<Vec<HistoryItem>>;

    async fn health_check(&self) -> Result<bool>;

    fn backend_name(&self) -> &'static str;
}
