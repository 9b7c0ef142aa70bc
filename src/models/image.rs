use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::AspectRatio;

pub const DEFAULT_NUM_IMAGES: u32 = 4;

fn default_num_images() -> u32 {
    DEFAULT_NUM_IMAGES
}

/// Body of `POST /api/generate`. The model id stays a string so an unknown id
/// can be answered with a 400 instead of a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub style: Option<String>,
    pub model_id: String,
    pub aspect: AspectRatio,
    pub resolution: u32,
    pub cfg: f64,
    pub steps: u32,
    pub seed: i64,
    #[serde(default = "default_num_images")]
    pub num_images: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageGenerationResponse {
    pub images: Vec<ImageUrl>,
    pub seed: i64,
    pub width: u32,
    pub height: u32,
}

impl ImageGenerationResponse {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|image| image.url.as_str())
    }
}

/// Input sent to a fal text-to-image route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FalImageInput {
    pub prompt: String,
    pub seed: i64,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    pub enable_safety_checker: bool,
}

/// One image entry as a provider may return it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
    Other(Value),
}

impl ImageRef {
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            ImageRef::Url(url) => url.as_str(),
            ImageRef::Object { url: Some(url) } => url.as_str(),
            _ => return None,
        };
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FalImageOutput {
    #[serde(default)]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl FalImageOutput {
    /// Flattens either output shape into image URLs, in provider order.
    /// An `images` list wins over a single `image`.
    pub fn image_urls(&self) -> Vec<String> {
        if let Some(images) = &self.images {
            images
                .iter()
                .filter_map(ImageRef::url)
                .map(String::from)
                .collect()
        } else if let Some(image) = &self.image {
            image.url().map(String::from).into_iter().collect()
        } else {
            Vec::new()
        }
    }
}
