use serde::{Deserialize, Serialize};

/// Maximum number of rows returned for one collection.
pub const HISTORY_READ_LIMIT: usize = 200;
/// Columns stored per history row.
pub const HISTORY_COLUMN_COUNT: usize = 11;
/// Most records one write may carry; a single insert binds every column of
/// every row and PostgreSQL caps a statement at 65535 parameters.
pub const HISTORY_BATCH_LIMIT: usize = u16::MAX as usize / HISTORY_COLUMN_COUNT;

/// A persisted generation record. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub collection_id: String,
    pub created_at: i64,
    pub prompt: String,
    pub style: Option<String>,
    pub model_id: String,
    pub aspect: String,
    pub seed: i64,
    pub width: i32,
    pub height: i32,
    pub image_url: String,
}

/// One item of a history write payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryRecord {
    pub prompt: String,
    pub style: Option<String>,
    pub model_id: String,
    pub aspect: String,
    pub seed: i64,
    pub width: i32,
    pub height: i32,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl HistoryRecord {
    pub fn into_item(self, id: String, collection_id: &str, now: i64) -> HistoryItem {
        HistoryItem {
            id,
            collection_id: collection_id.to_string(),
            created_at: self.created_at.unwrap_or(now),
            prompt: self.prompt,
            style: self.style,
            model_id: self.model_id,
            aspect: self.aspect,
            seed: self.seed,
            width: self.width,
            height: self.height,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryWriteRequest {
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<HistoryRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub collection_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryListResponse {
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteAck {
    pub ok: bool,
}
