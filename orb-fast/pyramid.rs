use image::imageops::{self, FilterType};
use image::GrayImage;
use rayon::prelude::*;

use crate::types::ScaleLevel;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Scale levels for an image, dropping levels too small to hold a
    /// detection window of `2 * border + 1` pixels.
    pub fn generate_scale_levels(
        width: u32,
        height: u32,
        scale_factor: f32,
        n_levels: usize,
        border: usize,
    ) -> Vec<ScaleLevel> {
        let min_size = (2 * border + 1) as u32;
        let mut levels = Vec::with_capacity(n_levels);
        let mut current_scale = 1.0f32;

        for level in 0..n_levels {
            let scaled_width = ((width as f32) / current_scale).round() as u32;
            let scaled_height = ((height as f32) / current_scale).round() as u32;

            // Levels only shrink from here on
            if scaled_width < min_size || scaled_height < min_size {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
            });
            current_scale *= scale_factor;
        }

        levels
    }

    /// Build image pyramid from base image
    pub fn build_image_pyramid(img: &GrayImage, scale_levels: &[ScaleLevel]) -> Vec<GrayImage> {
        scale_levels
            .par_iter()
            .map(|sl| {
                if sl.level == 0 && (sl.width, sl.height) == img.dimensions() {
                    img.clone()
                } else {
                    imageops::resize(img, sl.width, sl.height, FilterType::Triangle)
                }
            })
            .collect()
    }
}
