pub mod image_client;

use crate::{
    error::Result,
    models::{FalImageInput, FalImageOutput},
};
use async_trait::async_trait;

pub use image_client::FalImageClient;

/// A hosted text-to-image backend addressed by route.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn run(&self, route: &str, input: &FalImageInput) -> Result<FalImageOutput>;
}
