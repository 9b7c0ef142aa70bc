pub mod uploadthing;

use crate::error::Result;
use async_trait::async_trait;

pub use uploadthing::UploadThingMirror;

/// Object store that can re-host an image found at a URL.
#[async_trait]
pub trait ImageMirror: Send + Sync {
    /// True when `url` already points into this store.
    fn is_hosted(&self, url: &str) -> bool;

    /// Copies the image at `url` and returns its new public URL.
    async fn upload(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Mirrored(String),
    Skipped(String),
    Fallback { original: String, reason: String },
}

impl MirrorOutcome {
    /// URL to persist.
    pub fn into_url(self) -> String {
        match self {
            MirrorOutcome::Mirrored(url) | MirrorOutcome::Skipped(url) => url,
            MirrorOutcome::Fallback { original, .. } => original,
        }
    }
}

/// Best-effort copy; never fails, the original URL is kept on any error.
pub async fn mirror_image(mirror: &dyn ImageMirror, url: &str) -> MirrorOutcome {
    if url.is_empty() || mirror.is_hosted(url) {
        return MirrorOutcome::Skipped(url.to_string());
    }

    match mirror.upload(url).await {
        Ok(mirrored) if !mirrored.is_empty() => {
            log::debug!("Mirrored {} -> {}", url, mirrored);
            MirrorOutcome::Mirrored(mirrored)
        }
        Ok(_) => {
            log::warn!("Image mirror returned no URL for {}, keeping original", url);
            MirrorOutcome::Fallback {
                original: url.to_string(),
                reason: "empty mirror URL".to_string(),
            }
        }
        Err(e) => {
            log::error!("Image mirror failed for {}: {}", url, e);
            MirrorOutcome::Fallback {
                original: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
