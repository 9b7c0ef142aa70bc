use crate::{
    config::FalConfig,
    error::{Result, StudioError},
    fal::InferenceProvider,
    models::{FalImageInput, FalImageOutput},
};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};

#[derive(Clone)]
pub struct FalImageClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl FalImageClient {
    pub fn new(config: &FalConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }
}

#[async_trait]
impl InferenceProvider for FalImageClient {
    async fn run(&self, route: &str, input: &FalImageInput) -> Result<FalImageOutput> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| StudioError::ConfigError("FAL_KEY is not set".into()))?;

        log::info!(
            "Generating {} image(s) with route: {} ({}x{})",
            input.num_images,
            route,
            input.width,
            input.height
        );

        let response = self
            .client
            .post(self.endpoint(route))
            .header(AUTHORIZATION, format!("Key {}", api_key))
            .json(input)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("fal request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::ResponseError(format!(
                "fal returned {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StudioError::ResponseError(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| StudioError::ResponseError(e.to_string()))
    }
}
