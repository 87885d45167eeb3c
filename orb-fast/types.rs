use gms_core::Keypoint;
use image::GrayImage;

/// FAST corner in level coordinates with its segment-test score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: u32,
}

/// Corner ranked by Harris response, still in level coordinates
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub x: u32,
    pub y: u32,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

/// Keypoints detected on an image together with the pyramid they came from.
///
/// Keypoints are ordered by octave, so descriptor extraction can walk them
/// level by level against `levels`.
#[derive(Debug, Clone)]
pub struct Detection {
    pub keypoints: Vec<Keypoint>,
    pub levels: Vec<GrayImage>,
    pub scale_levels: Vec<ScaleLevel>,
}

impl Detection {
    pub fn empty() -> Self {
        Self {
            keypoints: Vec::new(),
            levels: Vec::new(),
            scale_levels: Vec::new(),
        }
    }
}

/// Polarity of a pixel relative to the segment-test centre
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
