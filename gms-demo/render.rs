use gms_core::{Keypoint, Match};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PALETTE_SEED: u64 = 0x6d5_2024;
const KEYPOINT_RADIUS: i32 = 3;
const UNMATCHED: Rgb<u8> = Rgb([90, 90, 90]);

/// Side-by-side composite of two images with match lines.
///
/// The canvas is `w1 + w2` wide and `max(h1, h2)` tall, `img1` at the origin
/// and `img2` directly to its right; uncovered pixels stay black. Every
/// keypoint gets a grey circle; every match gets a line and two circles in
/// its own colour. Matches whose indices fall outside the keypoint sets are
/// skipped.
pub fn draw_matches(
    img1: &RgbImage,
    kp1: &[Keypoint],
    img2: &RgbImage,
    kp2: &[Keypoint],
    matches: &[Match],
) -> RgbImage {
    let (w1, h1) = img1.dimensions();
    let (w2, h2) = img2.dimensions();
    let offset = w1 as f32;

    let mut canvas = RgbImage::new(w1 + w2, h1.max(h2));
    imageops::overlay(&mut canvas, img1, 0, 0);
    imageops::overlay(&mut canvas, img2, w1 as i64, 0);

    for kp in kp1 {
        circle(&mut canvas, kp.x, kp.y, UNMATCHED);
    }
    for kp in kp2 {
        circle(&mut canvas, kp.x + offset, kp.y, UNMATCHED);
    }

    let mut rng = StdRng::seed_from_u64(PALETTE_SEED);
    for m in matches {
        // Drawn colours do not depend on which matches were skipped
        let color = Rgb([rng.gen_range(64..=255), rng.gen_range(64..=255), rng.gen_range(64..=255)]);
        let (Some(a), Some(b)) = (kp1.get(m.query_idx), kp2.get(m.train_idx)) else {
            continue;
        };

        draw_line_segment_mut(&mut canvas, (a.x, a.y), (b.x + offset, b.y), color);
        circle(&mut canvas, a.x, a.y, color);
        circle(&mut canvas, b.x + offset, b.y, color);
    }

    canvas
}

fn circle(canvas: &mut RgbImage, x: f32, y: f32, color: Rgb<u8>) {
    draw_hollow_circle_mut(canvas, (x.round() as i32, y.round() as i32), KEYPOINT_RADIUS, color);
}
