use crate::image_io::Frame;
use gms_core::{Descriptor, DetectorKind, Keypoint};
use image::GrayImage;
use log::{debug, info};
use orb_brief::BriefGenerator;
use orb_fast::{DetectorBuilder, OrbConfig};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unknown detector kind '{0}'")]
    DetectorUnknown(String),

    #[error("{detector} extraction failed: {reason}")]
    Extraction { detector: DetectorKind, reason: String },
}

/// Keypoints and their descriptor rows, index for index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Something that finds and describes keypoints in a grayscale image
pub trait FeatureExtractor: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn max_features(&self) -> usize;

    fn detect_and_compute(&self, image: &GrayImage) -> Result<Features, ExtractError>;
}

/// Multi-scale FAST keypoints with steered BRIEF descriptors
pub struct OrbExtractor {
    config: OrbConfig,
    brief: BriefGenerator,
}

impl OrbExtractor {
    pub fn new(config: OrbConfig) -> Self {
        let brief = BriefGenerator::new(config.patch_size);
        Self { config, brief }
    }

    pub fn with_features(max_features: usize) -> Self {
        Self::new(OrbConfig::with_features(max_features))
    }

    fn failure(&self, reason: impl ToString) -> ExtractError {
        ExtractError::Extraction {
            detector: self.kind(),
            reason: reason.to_string(),
        }
    }
}

impl FeatureExtractor for OrbExtractor {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Orb
    }

    fn max_features(&self) -> usize {
        self.config.n_features
    }

    fn detect_and_compute(&self, image: &GrayImage) -> Result<Features, ExtractError> {
        let start = Instant::now();
        let detector = DetectorBuilder::from_config(self.config.clone())
            .build()
            .map_err(|e| self.failure(e))?;
        let detection = detector.detect(image).map_err(|e| self.failure(e))?;
        let detect_time = start.elapsed();

        let scales: Vec<f32> = detection.scale_levels.iter().map(|l| l.scale).collect();
        let descriptors = self
            .brief
            .generate_descriptors(&detection.levels, &scales, &detection.keypoints);

        if descriptors.len() != detection.keypoints.len() {
            return Err(self.failure(format!(
                "{} descriptors for {} keypoints",
                descriptors.len(),
                detection.keypoints.len()
            )));
        }

        debug!(
            "orb: {} keypoints over {} levels, detect {:.2?}, total {:.2?}",
            detection.keypoints.len(),
            detection.levels.len(),
            detect_time,
            start.elapsed()
        );
        Ok(Features {
            keypoints: detection.keypoints,
            descriptors,
        })
    }
}

/// Extractor for a detector tag, capped at `max_features` keypoints.
/// Unknown tags give `None`.
pub fn create_extractor(tag: &str, max_features: usize) -> Option<Box<dyn FeatureExtractor>> {
    match tag.parse::<DetectorKind>().ok()? {
        DetectorKind::Orb => Some(Box::new(OrbExtractor::with_features(max_features))),
    }
}

/// Keypoints and descriptors of `frame` using the detector named by `tag`
pub fn detect_and_compute(tag: &str, frame: &Frame, max_features: usize) -> Result<Features, ExtractError> {
    let extractor = create_extractor(tag, max_features).ok_or_else(|| ExtractError::DetectorUnknown(tag.to_string()))?;
    extract_features(extractor.as_ref(), frame)
}

/// Run an already resolved extractor on `frame`
pub fn extract_features(extractor: &dyn FeatureExtractor, frame: &Frame) -> Result<Features, ExtractError> {
    let gray = frame.to_gray().ok_or_else(|| ExtractError::Extraction {
        detector: extractor.kind(),
        reason: "image is empty".to_string(),
    })?;

    let features = extractor.detect_and_compute(&gray)?;
    info!(
        "{} extracted {} features from {}x{} image",
        extractor.kind(),
        features.len(),
        gray.width(),
        gray.height()
    );
    Ok(features)
}
