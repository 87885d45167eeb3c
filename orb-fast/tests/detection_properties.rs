use image::GrayImage;
use orb_fast::DetectorBuilder;
use proptest::prelude::*;

fn noise_image(width: u32, height: u32, pixels: &[u8]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize % pixels.len();
        image::Luma([pixels[i]])
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn keypoints_never_exceed_budget(
        width in 64u32..160,
        height in 64u32..160,
        budget in 1usize..300,
        pixels in prop::collection::vec(any::<u8>(), 257..1024),
    ) {
        let img = noise_image(width, height, &pixels);
        let detector = DetectorBuilder::new().max_features(budget).build().unwrap();
        let detection = detector.detect(&img).unwrap();

        prop_assert!(detection.keypoints.len() <= budget);
        for kp in &detection.keypoints {
            prop_assert!(kp.x >= 0.0 && kp.x < width as f32);
            prop_assert!(kp.y >= 0.0 && kp.y < height as f32);
            prop_assert!((kp.octave as usize) < detection.scale_levels.len());
        }
    }

    #[test]
    fn detection_repeats_exactly(
        pixels in prop::collection::vec(any::<u8>(), 257..1024),
    ) {
        let img = noise_image(128, 96, &pixels);
        let detector = DetectorBuilder::new().max_features(200).build().unwrap();
        let first = detector.detect(&img).unwrap();
        let second = detector.detect(&img).unwrap();
        prop_assert_eq!(first.keypoints, second.keypoints);
    }

    #[test]
    fn detection_ignores_pool_size(
        pixels in prop::collection::vec(any::<u8>(), 257..1024),
    ) {
        let img = noise_image(128, 96, &pixels);
        let detector = DetectorBuilder::new().max_features(200).build().unwrap();
        let run_with = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            pool.install(|| detector.detect(&img).unwrap())
        };

        let single = run_with(1);
        let many = run_with(4);
        prop_assert_eq!(single.keypoints, many.keypoints);
        prop_assert_eq!(single.levels, many.levels);
    }
}
