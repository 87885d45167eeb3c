use image::GrayImage;

use crate::types::ScoredKeypoint;

/// Orientation assignment and response-based keypoint selection
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Orientation by intensity centroid over a circular patch.
    ///
    /// Pixels outside the image are skipped, so points near the border still
    /// get an angle from the part of the patch that is available.
    pub fn compute_orientation(img: &GrayImage, x: u32, y: u32, half_patch: u32) -> f32 {
        let (width, height) = img.dimensions();
        let r = half_patch as i32;
        let (cx, cy) = (x as i32, y as i32);

        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -r..=r {
            let yy = cy + dy;
            if yy < 0 || yy >= height as i32 {
                continue;
            }
            let span = (((r * r - dy * dy) as f32).sqrt()) as i32;
            for dx in -span..=span {
                let xx = cx + dx;
                if xx < 0 || xx >= width as i32 {
                    continue;
                }
                let val = img.get_pixel(xx as u32, yy as u32).0[0] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Keep the `n` strongest keypoints.
    ///
    /// Ordering is by descending response, then by position, so the result
    /// does not depend on the input order.
    pub fn retain_best(mut keypoints: Vec<ScoredKeypoint>, n: usize) -> Vec<ScoredKeypoint> {
        keypoints.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        keypoints.truncate(n);
        keypoints
    }
}
