use image::GrayImage;
use rayon::prelude::*;

use crate::types::{Corner, CornerType};

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// Bresenham circle of radius 3, clockwise from the top
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Contiguous arc length required by FAST-9
    const ARC_LENGTH: usize = 9;

    /// Detect FAST-9 corners inside `border` and keep 3x3 score maxima
    pub fn detect_corners(img: &GrayImage, threshold: u8, border: u32) -> Vec<Corner> {
        let (width, height) = img.dimensions();
        // The circle itself needs 3 pixels of margin
        let border = border.max(3);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        let scores: Vec<u32> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = vec![0u32; width as usize];
                if y >= border && y < height - border {
                    for x in border..width - border {
                        row[x as usize] = Self::fast_score(img, x, y, threshold);
                    }
                }
                row
            })
            .collect();

        Self::non_maximum_suppression(&scores, width, height, border)
    }

    /// Segment-test score of a pixel, 0 when it is not a corner.
    ///
    /// The score is the summed intensity excess over `threshold` of the
    /// circle pixels on the winning side.
    pub fn fast_score(img: &GrayImage, x: u32, y: u32, threshold: u8) -> u32 {
        let center = img.get_pixel(x, y).0[0] as i32;
        let t = threshold as i32;

        let mut types = [CornerType::None; 16];
        let mut bright_sum = 0u32;
        let mut dark_sum = 0u32;
        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let px = (x as i32 + dx) as u32;
            let py = (y as i32 + dy) as u32;
            let value = img.get_pixel(px, py).0[0] as i32;
            if value > center + t {
                types[i] = CornerType::Bright;
                bright_sum += (value - center - t) as u32;
            } else if value < center - t {
                types[i] = CornerType::Dark;
                dark_sum += (center - t - value) as u32;
            }
        }

        let bright = Self::longest_arc(&types, CornerType::Bright) >= Self::ARC_LENGTH;
        let dark = Self::longest_arc(&types, CornerType::Dark) >= Self::ARC_LENGTH;
        match (bright, dark) {
            (true, _) => bright_sum.max(1),
            (false, true) => dark_sum.max(1),
            _ => 0,
        }
    }

    /// Longest run of `kind` around the circle, wrapping at the end
    fn longest_arc(types: &[CornerType; 16], kind: CornerType) -> usize {
        let mut best = 0;
        let mut run = 0;
        for i in 0..32 {
            if types[i % 16] == kind {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best.min(16)
    }

    /// 3x3 non-maximum suppression over a dense score map.
    ///
    /// On plateaus only the first pixel in raster order survives.
    pub fn non_maximum_suppression(scores: &[u32], width: u32, height: u32, border: u32) -> Vec<Corner> {
        let w = width as usize;
        let at = |x: u32, y: u32| scores[y as usize * w + x as usize];

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in border..width - border {
                    let score = at(x, y);
                    if score == 0 {
                        continue;
                    }
                    let mut is_max = true;
                    'neighbours: for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let other = at((x as i32 + dx) as u32, (y as i32 + dy) as u32);
                            let earlier = dy < 0 || (dy == 0 && dx < 0);
                            if other > score || (earlier && other == score) {
                                is_max = false;
                                break 'neighbours;
                            }
                        }
                    }
                    if is_max {
                        row.push(Corner { x, y, score });
                    }
                }
                row
            })
            .collect()
    }

    /// Harris corner response over a `block_size` window of Sobel gradients
    pub fn compute_harris_response(img: &GrayImage, x: u32, y: u32, block_size: u32) -> f32 {
        let (width, height) = img.dimensions();
        let r = (block_size / 2) as i32;
        // Window plus one pixel for the Sobel kernel
        if (x as i32) < r + 1
            || (y as i32) < r + 1
            || x as i32 + r + 1 >= width as i32
            || y as i32 + r + 1 >= height as i32
        {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for dy in -r..=r {
            for dx in -r..=r {
                let nx = (x as i32 + dx) as u32;
                let ny = (y as i32 + dy) as u32;
                let (gx, gy) = Self::compute_gradients(img, nx, ny);
                ixx += gx * gx;
                ixy += gx * gy;
                iyy += gy * gy;
            }
        }

        // det(M) - k * trace(M)^2
        const K: f64 = 0.04;
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        (det - K * trace * trace) as f32
    }

    /// Sobel gradients at an interior pixel
    fn compute_gradients(img: &GrayImage, x: u32, y: u32) -> (f64, f64) {
        let p = |dx: i32, dy: i32| img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32).0[0] as f64;

        let gx = p(1, -1) + 2.0 * p(1, 0) + p(1, 1) - p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1);
        let gy = p(-1, 1) + 2.0 * p(0, 1) + p(1, 1) - p(-1, -1) - 2.0 * p(0, -1) - p(1, -1);

        (gx / 8.0, gy / 8.0)
    }
}
