use crate::{
    compose::Composer,
    error::{ErrorBody, Result, StudioError},
    models::{
        HistoryItem, HistoryListResponse, HistoryWriteRequest, ImageGenerationRequest,
        ImageGenerationResponse,
    },
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// HTTP client for a running fluxstudio server: the same calls a browser
/// page makes for one generation cycle.
#[derive(Clone)]
pub struct StudioClient {
    client: Client,
    base_url: String,
    collection_id: Option<String>,
}

impl StudioClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection_id: None,
        }
    }

    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn generate(&self, request: &ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(request)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(e.to_string()))?;
        decode(response).await
    }

    pub async fn save_history(&self, batch: &HistoryWriteRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/history"))
            .json(batch)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(e.to_string()))?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }

    pub async fn load_history(&self, collection_id: &str) -> Result<Vec<HistoryItem>> {
        let response = self
            .client
            .get(self.url("/api/history"))
            .query(&[("collectionId", collection_id)])
            .send()
            .await
            .map_err(|e| StudioError::RequestError(e.to_string()))?;
        let list: HistoryListResponse = decode(response).await?;
        Ok(list.items)
    }

    /// Generates, then records the batch in the client's collection when one
    /// is set. A failed history write is logged and does not fail the call.
    pub async fn generate_and_record(&self, composer: &Composer) -> Result<ImageGenerationResponse> {
        if !composer.can_generate() {
            return Err(StudioError::InvalidPayload);
        }

        let result = self.generate(&composer.request()).await?;

        if let Some(collection_id) = &self.collection_id {
            let batch = composer.history_batch(collection_id, &result);
            if batch.items.as_ref().map_or(false, |items| !items.is_empty()) {
                if let Err(e) = self.save_history(&batch).await {
                    log::error!("Failed to persist history: {}", e);
                }
            }
        }

        Ok(result)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| StudioError::ResponseError(e.to_string()));
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    Err(match status.as_u16() {
        400 if message.starts_with("Unsupported modelId") => StudioError::UnsupportedModel(
            message.trim_start_matches("Unsupported modelId: ").to_string(),
        ),
        400 if message == "Missing collectionId" => StudioError::MissingCollectionId,
        400 => StudioError::InvalidPayload,
        501 => StudioError::StoreNotConfigured,
        _ => StudioError::ResponseError(format!("{}: {}", status, message)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = StudioClient::new("http://localhost:3000/").with_collection("abc123");
        assert_eq!(client.url("/api/history"), "http://localhost:3000/api/history");
        assert_eq!(client.collection_id(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_locally() {
        let client = StudioClient::new("http://127.0.0.1:9");
        let err = client
            .generate_and_record(&Composer::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidPayload));
    }
}
