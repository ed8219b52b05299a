//! Runtime configuration, loadable from TOML.
//!
//! ```toml
//! max_batch_writes = 500
//! recent_activity_limit = 20
//!
//! [upload]
//! presets = ["story_covers", "ml_default"]
//! default_folder = "covers"
//! max_bytes = 10485760
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_MAX_BATCH_WRITES;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressConfig {
    /// Upper bound on writes per commit when cascading a story delete.
    pub max_batch_writes: usize,
    /// Default number of edit log entries returned by the activity feed.
    pub recent_activity_limit: usize,
    pub upload: UploadConfig,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            max_batch_writes: DEFAULT_MAX_BATCH_WRITES,
            recent_activity_limit: 20,
            upload: UploadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Upload presets, tried in order until one is accepted.
    pub presets: Vec<String>,
    pub default_folder: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            presets: vec!["story_covers".to_string(), "ml_default".to_string()],
            default_folder: "covers".to_string(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl PressConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: PressConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_writes < 2 {
            return Err(ConfigError::Invalid(
                "max_batch_writes must allow at least 2 writes".into(),
            ));
        }
        if self.upload.presets.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("upload presets must not be blank".into()));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".into()));
        }
        Ok(())
    }
}
