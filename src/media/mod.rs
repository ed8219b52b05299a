//! Media - Cover image uploads through a hosted image service.
//!
//! The image host is the [`ImageUploader`] trait. [`FallbackUploader`]
//! validates a request once and then tries each configured upload preset in
//! order, returning the first durable URL.
//!
//! ```ignore
//! let uploader = FallbackUploader::new(InMemoryImageHost::new("https://img.test"), config.upload);
//! let image = uploader.upload(&UploadRequest::new("cover.png", bytes)).await?;
//! manager.set_story_cover(&story_id, Some(image.url)).await?;
//! ```

mod fallback;
mod in_memory;
mod request;

use async_trait::async_trait;

pub use fallback::FallbackUploader;
pub use in_memory::InMemoryImageHost;
pub use request::{UploadRequest, UploadedImage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("preset {preset} rejected the upload: {reason}")]
    Rejected { preset: String, reason: String },

    #[error("no upload presets configured")]
    NoPresets,

    #[error("all upload presets failed: {}", attempts.join("; "))]
    Exhausted { attempts: Vec<String> },

    #[error("image host error: {0}")]
    Host(String),
}

/// A hosted image service.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload with a single preset into `folder`, returning the durable URL.
    async fn upload(
        &self,
        request: &UploadRequest,
        folder: &str,
        preset: &str,
    ) -> Result<UploadedImage, UploadError>;
}
