use crate::error::{FastError, FastResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ORB detection parameters.
///
/// Defaults follow the usual ORB settings: 1.2 scale factor over 8 levels,
/// FAST threshold 20 and a 31 pixel patch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    /// Upper bound on keypoints returned per image
    pub n_features: usize,
    pub scale_factor: f32,
    pub n_levels: usize,
    /// Pixels at each level border where no corner is reported
    pub edge_threshold: usize,
    pub fast_threshold: u8,
    pub patch_size: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            fast_threshold: 20,
            patch_size: 31,
        }
    }
}

impl OrbConfig {
    /// Default configuration with a custom feature budget
    pub fn with_features(n_features: usize) -> Self {
        Self {
            n_features,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        if self.n_features == 0 {
            return Err(FastError::ZeroFeatureBudget);
        }
        if self.fast_threshold == 0 || self.fast_threshold > 127 {
            return Err(FastError::InvalidThreshold(self.fast_threshold));
        }
        if !(self.scale_factor > 1.0) || !self.scale_factor.is_finite() {
            return Err(FastError::InvalidScaleFactor(self.scale_factor));
        }
        if self.n_levels == 0 || self.n_levels > 32 {
            return Err(FastError::InvalidLevels(self.n_levels));
        }
        if self.patch_size < 7 || self.patch_size % 2 == 0 {
            return Err(FastError::InvalidPatchSize(self.patch_size));
        }
        let half_patch = self.patch_size / 2;
        if self.edge_threshold < half_patch {
            return Err(FastError::InvalidEdgeThreshold {
                edge_threshold: self.edge_threshold,
                half_patch,
            });
        }
        Ok(())
    }

    /// Keypoint budget of every pyramid level.
    ///
    /// Shares shrink geometrically with the scale; the last level takes
    /// whatever rounding left over so the shares sum to `n_features`.
    pub fn features_per_level(&self) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor as f64;
        let n_levels = self.n_levels.max(1);
        let mut desired = self.n_features as f64 * (1.0 - factor)
            / (1.0 - factor.powi(n_levels as i32));

        let mut counts = Vec::with_capacity(n_levels);
        let mut assigned = 0usize;
        for _ in 0..n_levels - 1 {
            let n = (desired.round() as usize).min(self.n_features - assigned);
            counts.push(n);
            assigned += n;
            desired *= factor;
        }
        counts.push(self.n_features - assigned);
        counts
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "OrbConfig: features={}, levels={}x{:.2}, fast_threshold={}, patch={}, edge={}",
            self.n_features,
            self.n_levels,
            self.scale_factor,
            self.fast_threshold,
            self.patch_size,
            self.edge_threshold
        )
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OrbConfig::default().validate().is_ok());
        assert!(OrbConfig::with_features(10_000).validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let mut cfg = OrbConfig::default();
        cfg.fast_threshold = 0;
        assert_eq!(cfg.validate(), Err(FastError::InvalidThreshold(0)));

        let mut cfg = OrbConfig::default();
        cfg.scale_factor = 1.0;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidScaleFactor(_))));

        let mut cfg = OrbConfig::default();
        cfg.n_levels = 0;
        assert_eq!(cfg.validate(), Err(FastError::InvalidLevels(0)));

        let mut cfg = OrbConfig::default();
        cfg.patch_size = 16;
        assert_eq!(cfg.validate(), Err(FastError::InvalidPatchSize(16)));

        let mut cfg = OrbConfig::default();
        cfg.edge_threshold = 3;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidEdgeThreshold { .. })));

        let cfg = OrbConfig::with_features(0);
        assert_eq!(cfg.validate(), Err(FastError::ZeroFeatureBudget));
    }

    #[test]
    fn test_features_per_level_sum_to_budget() {
        for n in [1, 7, 500, 10_000] {
            let cfg = OrbConfig::with_features(n);
            let counts = cfg.features_per_level();
            assert_eq!(counts.len(), cfg.n_levels);
            assert_eq!(counts.iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn test_features_per_level_decrease() {
        let counts = OrbConfig::with_features(10_000).features_per_level();
        for pair in counts[..counts.len() - 1].windows(2) {
            assert!(pair[0] >= pair[1], "{:?}", counts);
        }
        assert!(counts[0] > 2100 && counts[0] < 2250, "{:?}", counts);
    }

    #[test]
    fn test_single_level_takes_whole_budget() {
        let cfg = OrbConfig {
            n_levels: 1,
            ..OrbConfig::with_features(123)
        };
        assert_eq!(cfg.features_per_level(), vec![123]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialization_round_trip() {
        let cfg = OrbConfig::with_features(10_000);
        let json = cfg.to_json().unwrap();
        assert_eq!(OrbConfig::from_json(&json).unwrap(), cfg);

        let toml_str = cfg.to_toml().unwrap();
        assert_eq!(OrbConfig::from_toml(&toml_str).unwrap(), cfg);

        assert!(OrbConfig::from_toml("fast_threshold = 0").is_err());
    }
}
