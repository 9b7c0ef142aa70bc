use crate::{
    compose::{compose_prompt, resolve_dimensions},
    error::{Result, StudioError},
    fal::InferenceProvider,
    logger,
    models::{FalImageInput, ImageGenerationRequest, ImageGenerationResponse, ImageUrl, ModelId},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn InferenceProvider>,
}

impl GenerationService {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let model = ModelId::parse(&request.model_id)
            .ok_or_else(|| StudioError::UnsupportedModel(request.model_id.clone()))?;

        let dims = resolve_dimensions(request.aspect, request.resolution);
        let input = FalImageInput {
            prompt: compose_prompt(&request.prompt, request.style.as_deref()),
            seed: request.seed,
            num_inference_steps: request.steps,
            guidance_scale: request.cfg,
            width: dims.width,
            height: dims.height,
            num_images: request.num_images,
            enable_safety_checker: true,
        };

        let output = {
            let _timer = logger::timer(model.route());
            self.provider.run(model.route(), &input).await
        }
        .map_err(|e| {
            log::error!("Generation failed for {}: {}", model, e);
            StudioError::GenerationFailed
        })?;

        let images: Vec<ImageUrl> = output
            .image_urls()
            .into_iter()
            .map(|url| ImageUrl { url })
            .collect();
        log::info!("{} returned {} image(s)", model, images.len());

        Ok(ImageGenerationResponse {
            images,
            seed: output.seed.unwrap_or(request.seed),
            width: dims.width,
            height: dims.height,
        })
    }
}
