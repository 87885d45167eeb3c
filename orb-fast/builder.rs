use crate::config::OrbConfig;
use crate::detector::FastDetector;
use crate::error::FastResult;

/// Fluent construction of a [`FastDetector`]
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: OrbConfig,
}

impl DetectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: OrbConfig) -> Self {
        Self { config }
    }

    pub fn max_features(mut self, n_features: usize) -> Self {
        self.config.n_features = n_features;
        self
    }

    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.config.scale_factor = scale_factor;
        self
    }

    pub fn levels(mut self, n_levels: usize) -> Self {
        self.config.n_levels = n_levels;
        self
    }

    pub fn edge_threshold(mut self, edge_threshold: usize) -> Self {
        self.config.edge_threshold = edge_threshold;
        self
    }

    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.fast_threshold = threshold;
        self
    }

    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.patch_size = patch_size;
        self
    }

    /// Validate and build the detector
    pub fn build(self) -> FastResult<FastDetector> {
        FastDetector::new(self.config)
    }

    pub fn summary(&self) -> String {
        self.config.summary()
    }

    pub fn to_config(self) -> OrbConfig {
        self.config
    }
}
