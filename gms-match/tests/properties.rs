use gms_core::{Descriptor, GmsConfig, ImageSize, Keypoint, Match, DESCRIPTOR_SIZE};
use gms_match::{match_gms, BruteForceMatcher, GmsError};
use proptest::prelude::*;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn descriptors(n: usize) -> impl Strategy<Value = Vec<Descriptor>> {
    prop::collection::vec(prop::array::uniform32(any::<u8>()), n)
}

fn keypoints(max: usize) -> impl Strategy<Value = Vec<Keypoint>> {
    prop::collection::vec((0.0f32..WIDTH as f32, 0.0f32..HEIGHT as f32), 1..max)
        .prop_map(|pts| pts.into_iter().map(|(x, y)| Keypoint::new(x, y)).collect())
}

fn config() -> impl Strategy<Value = GmsConfig> {
    (any::<bool>(), any::<bool>()).prop_map(|(rotation, scale)| GmsConfig::new(rotation, scale))
}

/// Keypoints plus one candidate per query pointing at an arbitrary train row
fn problem() -> impl Strategy<Value = (Vec<Keypoint>, Vec<Keypoint>, Vec<Match>)> {
    (keypoints(300), keypoints(300)).prop_flat_map(|(kp1, kp2)| {
        let (n1, n2) = (kp1.len(), kp2.len());
        let candidates = prop::collection::vec(0..n2, n1).prop_map(|targets| {
            targets
                .into_iter()
                .enumerate()
                .map(|(q, t)| Match::new(q, t, (q % 64) as u32))
                .collect::<Vec<_>>()
        });
        (Just(kp1), Just(kp2), candidates)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn matcher_covers_every_query(
        (query, train) in (1usize..40, 1usize..40).prop_flat_map(|(q, t)| (descriptors(q), descriptors(t)))
    ) {
        let matches = BruteForceMatcher::new(false).match_descriptors(&query, &train);

        prop_assert_eq!(matches.len(), query.len());
        for (i, m) in matches.iter().enumerate() {
            prop_assert_eq!(m.query_idx, i);
            prop_assert!(m.train_idx < train.len());
            prop_assert!(m.distance <= (DESCRIPTOR_SIZE * 8) as u32);
            let best = train.iter().map(|t| gms_core::hamming_distance(&query[i], t)).min().unwrap();
            prop_assert_eq!(m.distance, best);
        }
    }

    #[test]
    fn cross_check_is_a_subset(
        (query, train) in (1usize..30, 1usize..30).prop_flat_map(|(q, t)| (descriptors(q), descriptors(t)))
    ) {
        let plain = BruteForceMatcher::new(false).match_descriptors(&query, &train);
        let checked = BruteForceMatcher::new(true).match_descriptors(&query, &train);
        prop_assert!(checked.len() <= plain.len());
        for m in &checked {
            prop_assert!(plain.contains(m));
        }
    }

    #[test]
    fn gms_returns_ordered_subsequence((kp1, kp2, candidates) in problem(), cfg in config()) {
        let size = ImageSize::new(WIDTH, HEIGHT);
        let kept = match_gms(size, size, &kp1, &kp2, &candidates, cfg).unwrap();

        prop_assert!(kept.len() <= candidates.len());
        let mut rest = candidates.iter();
        for m in &kept {
            prop_assert!(rest.any(|c| c == m));
        }
    }

    #[test]
    fn gms_repeats_exactly((kp1, kp2, candidates) in problem(), cfg in config()) {
        let size = ImageSize::new(WIDTH, HEIGHT);
        let first = match_gms(size, size, &kp1, &kp2, &candidates, cfg).unwrap();
        let second = match_gms(size, size, &kp1, &kp2, &candidates, cfg).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn gms_rejects_out_of_range_queries((kp1, kp2, mut candidates) in problem()) {
        let size = ImageSize::new(WIDTH, HEIGHT);
        candidates.push(Match::new(kp1.len(), 0, 0));
        let result = match_gms(size, size, &kp1, &kp2, &candidates, GmsConfig::default());
        let is_query_error = matches!(result, Err(GmsError::QueryIndexOutOfRange { .. }));
        prop_assert!(is_query_error);
    }
}
