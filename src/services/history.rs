use crate::{
    error::{Result, StudioError},
    mirror::{mirror_image, ImageMirror},
    models::{
        HistoryItem, HistoryRecord, HistoryWriteRequest, HISTORY_BATCH_LIMIT, HISTORY_READ_LIMIT,
    },
    storage::HistoryStore,
};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct HistoryService {
    store: Option<Arc<dyn HistoryStore>>,
    mirror: Option<Arc<dyn ImageMirror>>,
}

impl HistoryService {
    pub fn new(store: Option<Arc<dyn HistoryStore>>) -> Self {
        Self {
            store,
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn ImageMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_mirroring(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn store(&self) -> Option<&Arc<dyn HistoryStore>> {
        self.store.as_ref()
    }

    /// Appends a batch to a collection. Returns how many rows were written.
    pub async fn record(&self, request: HistoryWriteRequest) -> Result<usize> {
        let collection_id = request
            .collection_id
            .filter(|id| !id.is_empty())
            .ok_or(StudioError::InvalidPayload)?;
        let records = request
            .items
            .filter(|items| !items.is_empty() && items.len() <= HISTORY_BATCH_LIMIT)
            .ok_or(StudioError::InvalidPayload)?;

        let store = self.store.as_ref().ok_or(StudioError::StoreNotConfigured)?;

        let now = Utc::now().timestamp_millis();
        let items: Vec<HistoryItem> = join_all(
            records
                .into_iter()
                .map(|record| self.prepare(record, &collection_id, now)),
        )
        .await;

        let written = store.insert_batch(items).await?;
        log::info!(
            "Recorded {} history item(s) for collection {}",
            written,
            collection_id
        );
        Ok(written)
    }

    async fn prepare(&self, mut record: HistoryRecord, collection_id: &str, now: i64) -> HistoryItem {
        if let Some(mirror) = &self.mirror {
            record.image_url = mirror_image(mirror.as_ref(), &record.image_url)
                .await
                .into_url();
        }
        record.into_item(Uuid::new_v4().to_string(), collection_id, now)
    }

    /// Newest items of a collection, capped at 200. With no store configured
    /// the list is empty.
    pub async fn list(&self, collection_id: Option<&str>) -> Result<Vec<HistoryItem>> {
        let collection_id = collection_id
            .filter(|id| !id.is_empty())
            .ok_or(StudioError::MissingCollectionId)?;

        match &self.store {
            Some(store) => store.list(collection_id, HISTORY_READ_LIMIT).await,
            None => Ok(Vec::new()),
        }
    }
}
