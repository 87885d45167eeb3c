use crate::config::ConfigError;
use gms_match::GmsError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline failures
#[derive(Debug, Error)]
pub enum DemoError {
    #[error(
        "Unable to load images. Please check that {} and {} exist and are readable images.",
        first.display(),
        second.display()
    )]
    InputMissing { first: PathBuf, second: PathBuf },

    #[error("Invalid detector type '{0}' provided. Unable to detect and compute keypoints and descriptors with selected detector type.")]
    DetectorUnknown(String),

    #[error("Unable to detect and compute keypoints and descriptors with detector '{detector}': {reason}")]
    ExtractionFailure { detector: String, reason: String },

    #[error("GMS filtering failed: {0}")]
    Gms(#[from] GmsError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
