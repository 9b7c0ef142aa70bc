//! Request composition: the parameters a user picks, turned into the
//! payloads the generation and history endpoints expect.

pub mod dimensions;

pub use dimensions::{resolve_dimensions, Dimensions};

use reqwest::Url;
use uuid::Uuid;

use crate::models::{
    AspectRatio, HistoryRecord, HistoryWriteRequest, ImageGenerationRequest,
    ImageGenerationResponse, ModelId, DEFAULT_NUM_IMAGES,
};

pub const DEFAULT_RESOLUTION: u32 = 768;
pub const DEFAULT_CFG: f64 = 7.0;
pub const DEFAULT_STEPS: u32 = 30;
pub const SEED_RANGE: u64 = 1_000_000;
pub const COLLECTION_ID_LEN: usize = 8;
/// Query parameter that carries the collection id in the page URL.
pub const COLLECTION_QUERY_KEY: &str = "c";

/// Joins the prompt and optional style label into the provider's text field.
pub fn compose_prompt(prompt: &str, style: Option<&str>) -> String {
    let suffix = match style {
        Some(style) if !style.is_empty() => format!(", {}", style.to_lowercase()),
        _ => String::new(),
    };
    format!("{}{}", prompt.trim(), suffix).trim().to_string()
}

pub fn random_seed() -> i64 {
    (Uuid::new_v4().as_u128() % u128::from(SEED_RANGE)) as i64
}

pub fn new_collection_id() -> String {
    Uuid::new_v4().simple().to_string()[..COLLECTION_ID_LEN].to_string()
}

/// Returns the collection id found in a page query string, or a fresh one.
/// The flag is true when the id was generated and the page URL needs it added.
/// The value is form-decoded and only the first `c` counts.
pub fn collection_id_from_query(query: &str) -> (String, bool) {
    let found = Url::parse(&format!("http://localhost/?{}", query.trim_start_matches('?')))
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == COLLECTION_QUERY_KEY)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty());

    match found {
        Some(id) => (id, false),
        None => (new_collection_id(), true),
    }
}

/// The user's current choices for one generation.
#[derive(Debug, Clone)]
pub struct Composer {
    pub prompt: String,
    pub style: Option<String>,
    pub model: ModelId,
    pub aspect: AspectRatio,
    pub resolution: u32,
    pub cfg: f64,
    pub steps: u32,
    pub seed: i64,
    pub num_images: u32,
}

impl Default for Composer {
    fn default() -> Self {
        Composer {
            prompt: String::new(),
            style: None,
            model: ModelId::default(),
            aspect: AspectRatio::default(),
            resolution: DEFAULT_RESOLUTION,
            cfg: DEFAULT_CFG,
            steps: DEFAULT_STEPS,
            seed: random_seed(),
            num_images: DEFAULT_NUM_IMAGES,
        }
    }
}

impl Composer {
    pub fn new(prompt: impl Into<String>) -> Self {
        Composer {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn with_aspect(mut self, aspect: AspectRatio) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_guidance(mut self, cfg: f64, steps: u32) -> Self {
        self.cfg = cfg;
        self.steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn reset_seed(&mut self) {
        self.seed = random_seed();
    }

    pub fn can_generate(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    pub fn dimensions(&self) -> Dimensions {
        resolve_dimensions(self.aspect, self.resolution)
    }

    pub fn request(&self) -> ImageGenerationRequest {
        ImageGenerationRequest {
            prompt: self.prompt.trim().to_string(),
            style: self.style.clone(),
            model_id: self.model.as_str().to_string(),
            aspect: self.aspect,
            resolution: self.resolution,
            cfg: self.cfg,
            steps: self.steps,
            seed: self.seed,
            num_images: self.num_images,
        }
    }

    /// One history record per returned image; seeds count up from the
    /// resolved seed.
    pub fn history_batch(
        &self,
        collection_id: &str,
        result: &ImageGenerationResponse,
    ) -> HistoryWriteRequest {
        let items = result
            .urls()
            .enumerate()
            .map(|(index, url)| HistoryRecord {
                prompt: self.prompt.trim().to_string(),
                style: self.style.clone(),
                model_id: self.model.as_str().to_string(),
                aspect: self.aspect.as_str().to_string(),
                seed: result.seed.saturating_add(index as i64),
                width: i32::try_from(result.width).unwrap_or(i32::MAX),
                height: i32::try_from(result.height).unwrap_or(i32::MAX),
                image_url: url.to_string(),
                created_at: None,
            })
            .collect();

        HistoryWriteRequest {
            collection_id: Some(collection_id.to_string()),
            items: Some(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageUrl;

    #[test]
    fn test_compose_prompt() {
        assert_eq!(compose_prompt("  a fox ", Some("Neon noir")), "a fox, neon noir");
        assert_eq!(compose_prompt("a fox", None), "a fox");
        assert_eq!(compose_prompt("a fox", Some("")), "a fox");
        assert_eq!(compose_prompt("", Some("Watercolor")), ", watercolor");
    }

    #[test]
    fn test_collection_id_from_query() {
        assert_eq!(collection_id_from_query("?c=abc123"), ("abc123".to_string(), false));
        assert_eq!(
            collection_id_from_query("x=1&c=zz9&y"),
            ("zz9".to_string(), false)
        );

        let (id, generated) = collection_id_from_query("?c=");
        assert!(generated);
        assert_eq!(id.len(), COLLECTION_ID_LEN);

        let (_, generated) = collection_id_from_query("");
        assert!(generated);
    }

    #[test]
    fn test_collection_id_is_decoded() {
        assert_eq!(
            collection_id_from_query("?c=team%2Fa%20b"),
            ("team/a b".to_string(), false)
        );
        assert_eq!(collection_id_from_query("c=a+b"), ("a b".to_string(), false));
        assert_eq!(
            collection_id_from_query("?c=first&c=second"),
            ("first".to_string(), false)
        );
    }

    #[test]
    fn test_random_seed_range() {
        for _ in 0..100 {
            let seed = random_seed();
            assert!((0..SEED_RANGE as i64).contains(&seed));
        }
    }

    #[test]
    fn test_defaults() {
        let composer = Composer::default();
        assert_eq!(composer.model, ModelId::FluxPro);
        assert_eq!(composer.aspect, AspectRatio::Square);
        assert_eq!(composer.resolution, 768);
        assert_eq!(composer.steps, 30);
        assert_eq!(composer.num_images, 4);
        assert!(!composer.can_generate());
        assert!(Composer::new("a fox").can_generate());
    }

    #[test]
    fn test_history_batch_offsets_seeds() {
        let composer = Composer::new(" a fox ")
            .with_style("Cinematic")
            .with_aspect(AspectRatio::Widescreen)
            .with_seed(10);
        let result = ImageGenerationResponse {
            images: vec![
                ImageUrl { url: "https://a/1.png".into() },
                ImageUrl { url: "https://a/2.png".into() },
            ],
            seed: 500,
            width: 1024,
            height: 576,
        };

        let batch = composer.history_batch("abc123", &result);
        let items = batch.items.unwrap();
        assert_eq!(batch.collection_id.as_deref(), Some("abc123"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].seed, 500);
        assert_eq!(items[1].seed, 501);
        assert_eq!(items[1].prompt, "a fox");
        assert_eq!(items[1].aspect, "16:9");
        assert_eq!(items[0].width, 1024);
        assert_eq!(items[0].style.as_deref(), Some("Cinematic"));
    }

    #[test]
    fn test_history_batch_saturates_oversized_values() {
        let composer = Composer::new("a fox");
        let result = ImageGenerationResponse {
            images: vec![
                ImageUrl { url: "https://a/1.png".into() },
                ImageUrl { url: "https://a/2.png".into() },
            ],
            seed: i64::MAX,
            width: u32::MAX - 7,
            height: 576,
        };

        let items = composer.history_batch("abc123", &result).items.unwrap();
        assert_eq!(items[1].seed, i64::MAX);
        assert_eq!(items[0].width, i32::MAX);
        assert_eq!(items[0].height, 576);
    }
}
