use crate::{
    config::MirrorConfig,
    error::{Result, StudioError},
    mirror::ImageMirror,
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, multipart, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Files served from UploadThing's CDN already live in the store.
const HOSTED_MARKER: &str = "utfs.io";
const API_VERSION: &str = "6.4.0";
const DEFAULT_CONTENT_TYPE: &str = "image/png";

pub struct UploadThingMirror {
    client: Client,
    secret: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    data: Vec<PresignedUpload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignedUpload {
    url: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
    file_url: String,
}

impl UploadThingMirror {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            client: Client::new(),
            secret: config.secret.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_source(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Image fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StudioError::ResponseError(format!(
                "Image fetch returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::ResponseError(format!("Image body read failed: {}", e)))?;

        Ok((bytes.to_vec(), content_type))
    }

    async fn presign(&self, name: &str, size: usize, content_type: &str) -> Result<PresignedUpload> {
        let payload = json!({
            "files": [{ "name": name, "size": size, "type": content_type }],
            "acl": "public-read",
            "contentDisposition": "inline"
        });

        let response = self
            .client
            .post(format!("{}/v6/uploadFiles", self.api_url))
            .header("x-uploadthing-api-key", &self.secret)
            .header("x-uploadthing-version", API_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("UploadThing request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::ResponseError(format!(
                "UploadThing presign failed ({}): {}",
                status, error_text
            )));
        }

        let presigned: PresignResponse = response
            .json()
            .await
            .map_err(|e| StudioError::ResponseError(e.to_string()))?;

        presigned
            .data
            .into_iter()
            .next()
            .ok_or_else(|| StudioError::ResponseError("UploadThing returned no upload target".into()))
    }
}

fn file_extension(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .and_then(|mime| mime.split('/').nth(1))
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
}

fn field_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl ImageMirror for UploadThingMirror {
    fn is_hosted(&self, url: &str) -> bool {
        url.contains(HOSTED_MARKER)
    }

    async fn upload(&self, url: &str) -> Result<String> {
        let (bytes, content_type) = self.fetch_source(url).await?;
        let name = format!("gen-{}.{}", Uuid::new_v4(), file_extension(&content_type));
        let target = self.presign(&name, bytes.len(), &content_type).await?;

        let mut form = multipart::Form::new();
        for (key, value) in target.fields {
            form = form.text(key, field_value(value));
        }
        let part = multipart::Part::bytes(bytes)
            .file_name(name)
            .mime_str(&content_type)
            .map_err(|e| StudioError::RequestError(e.to_string()))?;
        form = form.part("file", part);

        let response = self
            .client
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StudioError::ResponseError(format!(
                "Upload returned {}",
                response.status()
            )));
        }

        Ok(target.file_url)
    }
}
