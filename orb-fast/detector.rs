use std::time::Instant;

use gms_core::Keypoint;
use image::GrayImage;
use log::debug;
use rayon::prelude::*;

use crate::config::OrbConfig;
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::pyramid::ImagePyramid;
use crate::refinement::KeypointRefinement;
use crate::types::{Detection, ScaleLevel, ScoredKeypoint};

/// Window of the Harris response used to rank FAST corners
const HARRIS_BLOCK_SIZE: u32 = 7;

/// Multi-scale FAST detector with Harris ranking and a feature budget
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: OrbConfig,
    level_budget: Vec<usize>,
}

impl FastDetector {
    /// Creates a new detector with validation
    pub fn new(cfg: OrbConfig) -> FastResult<Self> {
        cfg.validate()?;
        let level_budget = cfg.features_per_level();
        Ok(Self { cfg, level_budget })
    }

    /// Detect up to `n_features` oriented keypoints across the pyramid.
    ///
    /// Images too small for any level give an empty detection.
    pub fn detect(&self, img: &GrayImage) -> FastResult<Detection> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        let t0 = Instant::now();
        let scale_levels = ImagePyramid::generate_scale_levels(
            width,
            height,
            self.cfg.scale_factor,
            self.cfg.n_levels,
            self.cfg.edge_threshold,
        );
        if scale_levels.is_empty() {
            debug!("image {}x{} too small for detection", width, height);
            return Ok(Detection::empty());
        }

        let levels = ImagePyramid::build_image_pyramid(img, &scale_levels);

        let per_level: Vec<Vec<Keypoint>> = scale_levels
            .par_iter()
            .zip(levels.par_iter())
            .map(|(sl, level_img)| self.detect_keypoints_at_scale(level_img, sl))
            .collect();

        for (sl, kps) in scale_levels.iter().zip(&per_level) {
            debug!(
                "level {} ({}x{}, scale {:.3}): {} keypoints",
                sl.level,
                sl.width,
                sl.height,
                sl.scale,
                kps.len()
            );
        }

        let keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        debug!(
            "detected {} keypoints over {} levels in {:.2?}",
            keypoints.len(),
            scale_levels.len(),
            t0.elapsed()
        );

        Ok(Detection {
            keypoints,
            levels,
            scale_levels,
        })
    }

    /// Detect keypoints on one pyramid level, returned in level-0 coordinates
    pub fn detect_keypoints_at_scale(&self, img: &GrayImage, scale_level: &ScaleLevel) -> Vec<Keypoint> {
        let budget = self.level_budget.get(scale_level.level).copied().unwrap_or(0);
        if budget == 0 {
            return Vec::new();
        }

        let corners = CornerDetector::detect_corners(
            img,
            self.cfg.fast_threshold,
            self.cfg.edge_threshold as u32,
        );

        let scored: Vec<ScoredKeypoint> = corners
            .iter()
            .map(|c| ScoredKeypoint {
                x: c.x,
                y: c.y,
                response: CornerDetector::compute_harris_response(img, c.x, c.y, HARRIS_BLOCK_SIZE),
            })
            .collect();

        let half_patch = (self.cfg.patch_size / 2) as u32;
        let scale = scale_level.scale;
        let size = self.cfg.patch_size as f32 * scale;

        KeypointRefinement::retain_best(scored, budget)
            .into_iter()
            .map(|sk| Keypoint {
                x: sk.x as f32 * scale,
                y: sk.y as f32 * scale,
                size,
                angle: KeypointRefinement::compute_orientation(img, sk.x, sk.y, half_patch),
                response: sk.response,
                octave: scale_level.level as u32,
            })
            .collect()
    }
}
