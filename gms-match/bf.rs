use gms_core::{hamming_distance, Descriptor, Match};
use log::debug;
use rayon::prelude::*;
use std::time::Instant;

/// Exhaustive nearest-neighbour matcher under Hamming distance
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher {
    cross_check: bool,
}

impl BruteForceMatcher {
    pub fn new(cross_check: bool) -> Self {
        Self { cross_check }
    }

    pub fn cross_check(&self) -> bool {
        self.cross_check
    }

    /// Best train row for every query row.
    ///
    /// Ties go to the lowest train index. Without cross-check the result has
    /// one entry per query row in query order, or none when `train` is empty.
    /// With cross-check a pair survives only if the query is also the best
    /// match of its train row.
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        let forward: Vec<Match> = query
            .par_iter()
            .enumerate()
            .map(|(qi, q)| {
                let (ti, distance) = nearest(q, train);
                Match::new(qi, ti, distance)
            })
            .collect();

        let matches = if self.cross_check {
            let backward: Vec<usize> = train.par_iter().map(|t| nearest(t, query).0).collect();
            forward
                .into_iter()
                .filter(|m| backward[m.train_idx] == m.query_idx)
                .collect()
        } else {
            forward
        };

        debug!(
            "matched {} query against {} train descriptors: {} candidates in {:.2?}",
            query.len(),
            train.len(),
            matches.len(),
            start.elapsed()
        );
        matches
    }
}

/// Index and distance of the closest row, first index on ties.
/// `rows` must be non-empty.
fn nearest(needle: &Descriptor, rows: &[Descriptor]) -> (usize, u32) {
    let mut best = (0, u32::MAX);
    for (i, row) in rows.iter().enumerate() {
        let d = hamming_distance(needle, row);
        if d < best.1 {
            best = (i, d);
            if d == 0 {
                break;
            }
        }
    }
    best
}
