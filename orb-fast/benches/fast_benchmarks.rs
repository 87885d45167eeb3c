use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{GrayImage, Luma};
use orb_fast::corner_detection::CornerDetector;
use orb_fast::DetectorBuilder;

/// Create benchmark image with realistic corner patterns
fn create_benchmark_image(width: u32, height: u32) -> GrayImage {
    let mut img = GrayImage::from_fn(width, height, |x, y| {
        // Gradient with a little structured noise
        let gradient = ((x as f32 / width as f32) * 50.0) as u8;
        Luma([100 + gradient + ((x + y) % 7) as u8])
    });

    let mut i = 0u32;
    for cy in (16..height.saturating_sub(16)).step_by(20) {
        for cx in (16..width.saturating_sub(16)).step_by(20) {
            let half = 2 + (i * 3) % 5;
            let value = if i % 2 == 0 { 20 } else { 240 };
            for y in cy - half..=cy + half {
                for x in cx - half..=cx + half {
                    img.put_pixel(x, y, Luma([value]));
                }
            }
            i += 1;
        }
    }
    img
}

/// Benchmark full multi-scale detection
fn bench_full_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_detection");

    for &(width, height) in &[(256u32, 256u32), (640, 480), (1024, 768)] {
        let img = create_benchmark_image(width, height);
        for &budget in &[500usize, 10_000] {
            let detector = DetectorBuilder::new()
                .max_features(budget)
                .build()
                .unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("{}x{}", width, height), budget),
                &img,
                |b, img| b.iter(|| black_box(detector.detect(black_box(img)).unwrap())),
            );
        }
    }

    group.finish();
}

/// Benchmark individual corner stages on a single level
fn bench_corner_stages(c: &mut Criterion) {
    let img = create_benchmark_image(640, 480);
    let mut group = c.benchmark_group("corner_stages");

    group.bench_function("fast9_with_nms", |b| {
        b.iter(|| black_box(CornerDetector::detect_corners(black_box(&img), 20, 31)))
    });

    let corners = CornerDetector::detect_corners(&img, 20, 31);
    group.bench_function("harris_response", |b| {
        b.iter(|| {
            for corner in black_box(&corners) {
                black_box(CornerDetector::compute_harris_response(&img, corner.x, corner.y, 7));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_full_detection, bench_corner_stages);
criterion_main!(benches);
