use super::{ImageUploader, UploadError, UploadRequest, UploadedImage};
use crate::config::UploadConfig;

/// Validates uploads and retries across presets until one succeeds.
pub struct FallbackUploader<U> {
    host: U,
    config: UploadConfig,
}

impl<U: ImageUploader> FallbackUploader<U> {
    pub fn new(host: U, config: UploadConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &U {
        &self.host
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Check size and type limits. These failures are never retried.
    pub fn validate(&self, request: &UploadRequest) -> Result<(), UploadError> {
        if request.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if request.bytes.len() > self.config.max_bytes {
            return Err(UploadError::TooLarge {
                size: request.bytes.len(),
                max: self.config.max_bytes,
            });
        }
        if !request.is_image() {
            return Err(UploadError::UnsupportedType(request.content_type.clone()));
        }
        Ok(())
    }

    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadedImage, UploadError> {
        self.validate(request)?;
        if self.config.presets.is_empty() {
            return Err(UploadError::NoPresets);
        }

        let folder = request
            .folder
            .as_deref()
            .unwrap_or(self.config.default_folder.as_str());
        let mut attempts = Vec::new();

        for preset in &self.config.presets {
            match self.host.upload(request, folder, preset).await {
                Ok(image) => {
                    tracing::info!(
                        file = %request.file_name,
                        preset = %preset,
                        fallbacks = attempts.len(),
                        "image uploaded"
                    );
                    return Ok(image);
                }
                Err(err) => {
                    tracing::warn!(
                        file = %request.file_name,
                        preset = %preset,
                        error = %err,
                        "upload preset failed"
                    );
                    attempts.push(format!("{preset}: {err}"));
                }
            }
        }

        Err(UploadError::Exhausted { attempts })
    }
}
