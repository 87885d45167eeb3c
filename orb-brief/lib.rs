use gms_core::{Descriptor, Keypoint, DESCRIPTOR_SIZE};
use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

const DESCRIPTOR_BITS: usize = DESCRIPTOR_SIZE * 8;

/// Fixed seed so every generator samples the same test pattern
const PATTERN_SEED: u64 = 0x0b5e_ed5e_ed00_0256;

/// Smoothing applied to each level before the intensity tests
const BLUR_SIGMA: f32 = 2.0;

/// One intensity comparison: (x1, y1) < (x2, y2)
type PointPair = (i8, i8, i8, i8);

/// Steered BRIEF descriptor generator
pub struct BriefGenerator {
    pattern: Vec<PointPair>,
}

impl BriefGenerator {
    /// Generator for a square patch of `patch_size` pixels.
    ///
    /// Test points follow an isotropic Gaussian with sigma = patch_size / 5,
    /// clipped to the patch.
    pub fn new(patch_size: usize) -> Self {
        let half = (patch_size / 2) as f32;
        let sigma = (patch_size as f32 / 5.0).max(1.0);
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);

        let mut sample = || {
            let z: f32 = rng.sample(StandardNormal);
            (z * sigma).round().clamp(-half, half) as i8
        };
        let pattern = (0..DESCRIPTOR_BITS)
            .map(|_| (sample(), sample(), sample(), sample()))
            .collect();

        Self { pattern }
    }

    /// Describe keypoints detected on a pyramid.
    ///
    /// `levels[o]` is the level image for octave `o` and `scales[o]` its
    /// downscale factor; keypoints are in level-0 coordinates. The output
    /// has one row per keypoint, in keypoint order.
    pub fn generate_descriptors(&self, levels: &[GrayImage], scales: &[f32], kps: &[Keypoint]) -> Vec<Descriptor> {
        let blurred: Vec<GrayImage> = levels
            .par_iter()
            .map(|level| gaussian_blur_f32(level, BLUR_SIGMA))
            .collect();
        debug!("blurred {} pyramid levels for {} descriptors", blurred.len(), kps.len());

        kps.par_iter()
            .map(|kp| {
                let octave = kp.octave as usize;
                match (blurred.get(octave), scales.get(octave)) {
                    (Some(img), Some(&scale)) => self.describe(img, kp.x / scale, kp.y / scale, kp.angle),
                    // A keypoint without a level keeps an all-zero row
                    _ => [0u8; DESCRIPTOR_SIZE],
                }
            })
            .collect()
    }

    /// Describe a single point on an already smoothed image
    pub fn describe(&self, img: &GrayImage, x: f32, y: f32, angle: f32) -> Descriptor {
        let (s, c) = angle.sin_cos();
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &(x1, y1, x2, y2)) in self.pattern.iter().enumerate() {
            let val1 = Self::sample_rotated(img, x, y, c, s, x1, y1);
            let val2 = Self::sample_rotated(img, x, y, c, s, x2, y2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Pixel at a pattern offset rotated about (cx, cy), clamped to the image
    #[inline]
    fn sample_rotated(img: &GrayImage, cx: f32, cy: f32, c: f32, s: f32, dx: i8, dy: i8) -> u8 {
        let (w, h) = img.dimensions();
        let (dx, dy) = (dx as f32, dy as f32);
        let x = (cx + c * dx - s * dy).round().clamp(0.0, (w - 1) as f32) as u32;
        let y = (cy + s * dx + c * dy).round().clamp(0.0, (h - 1) as f32) as u32;
        img.get_pixel(x, y).0[0]
    }
}
