use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{ImageUploader, UploadError, UploadRequest, UploadedImage};

/// In-memory image host for tests and local development.
///
/// Clones share storage. When built with [`accepting_only`](Self::accepting_only),
/// uploads through any other preset are rejected the way a hosted service
/// rejects an unknown or disabled preset.
#[derive(Clone)]
pub struct InMemoryImageHost {
    base_url: String,
    accepted_presets: Option<HashSet<String>>,
    images: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryImageHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            accepted_presets: None,
            images: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn accepting_only(mut self, presets: &[&str]) -> Self {
        self.accepted_presets = Some(presets.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Bytes stored under a URL returned by an earlier upload.
    pub fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, UploadError> {
        let images = self
            .images
            .read()
            .map_err(|_| UploadError::Host("lock poisoned".into()))?;
        Ok(images.get(url).cloned())
    }

    pub fn len(&self) -> Result<usize, UploadError> {
        let images = self
            .images
            .read()
            .map_err(|_| UploadError::Host("lock poisoned".into()))?;
        Ok(images.len())
    }

    pub fn is_empty(&self) -> Result<bool, UploadError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ImageUploader for InMemoryImageHost {
    async fn upload(
        &self,
        request: &UploadRequest,
        folder: &str,
        preset: &str,
    ) -> Result<UploadedImage, UploadError> {
        if let Some(accepted) = &self.accepted_presets {
            if !accepted.contains(preset) {
                return Err(UploadError::Rejected {
                    preset: preset.to_string(),
                    reason: "upload preset not found".into(),
                });
            }
        }

        let url = format!(
            "{}/{}/{}-{}",
            self.base_url,
            folder.trim_matches('/'),
            uuid::Uuid::new_v4(),
            request.file_name
        );

        let mut images = self
            .images
            .write()
            .map_err(|_| UploadError::Host("lock poisoned".into()))?;
        images.insert(url.clone(), request.bytes.clone());

        Ok(UploadedImage {
            url,
            preset: preset.to_string(),
        })
    }
}
