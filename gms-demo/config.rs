use crate::driver::{DETECTOR, FIRST_IMAGE, MAX_FEATURES, SECOND_IMAGE};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory at startup
pub const CONFIG_FILE: &str = "gms_demo.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to serialize config as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("max_features must be greater than zero")]
    ZeroFeatureBudget,

    #[error("max_features {requested} exceeds the limit of {limit}")]
    FeatureBudgetTooLarge { requested: usize, limit: usize },

    #[error("n_threads must be greater than zero")]
    ZeroThreads,

    #[error("input image paths must not be empty")]
    EmptyPath,
}

/// Demo settings. Every field is optional in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub first_image: PathBuf,
    pub second_image: PathBuf,
    /// Detector tag handed to the extractor factory
    pub detector: String,
    pub max_features: usize,
    pub n_threads: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            first_image: PathBuf::from(FIRST_IMAGE),
            second_image: PathBuf::from(SECOND_IMAGE),
            detector: DETECTOR.to_string(),
            max_features: MAX_FEATURES,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl DemoConfig {
    /// The detector tag is not checked here; an unknown tag is reported when
    /// the pipeline asks for an extractor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_features == 0 {
            return Err(ConfigError::ZeroFeatureBudget);
        }
        if self.max_features > MAX_FEATURES {
            return Err(ConfigError::FeatureBudgetTooLarge {
                requested: self.max_features,
                limit: MAX_FEATURES,
            });
        }
        if self.n_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.first_image.as_os_str().is_empty() || self.second_image.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(())
    }

    /// Config from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!("loaded {} from {}", config.summary(), path.display());
        Ok(config)
    }

    pub fn summary(&self) -> String {
        format!(
            "DemoConfig: images=({}, {}), detector={}, max_features={}, threads={}",
            self.first_image.display(),
            self.second_image.display(),
            self.detector,
            self.max_features,
            self.n_threads
        )
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserialize from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
