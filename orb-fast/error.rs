use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FastError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),
    #[error("Invalid scale factor: {0} (must be > 1.0)")]
    InvalidScaleFactor(f32),
    #[error("Invalid number of pyramid levels: {0} (must be 1-32)")]
    InvalidLevels(usize),
    #[error("Invalid patch size: {0} (must be odd and at least 7)")]
    InvalidPatchSize(usize),
    #[error("Edge threshold {edge_threshold} smaller than half patch size {half_patch}")]
    InvalidEdgeThreshold { edge_threshold: usize, half_patch: usize },
    #[error("Feature budget must be positive")]
    ZeroFeatureBudget,
}

pub type FastResult<T> = Result<T, FastError>;
