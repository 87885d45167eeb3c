//! Grid-based motion statistics (GMS) match filtering.
//!
//! Both images are covered by coarse grids. A candidate survives when the
//! cell it starts in sends most of its matches to the cell it ends in and
//! the 3x3 neighbourhoods of the two cells agree strongly enough. Scale is
//! handled by resizing the right grid, rotation by permuting the right
//! neighbourhood.

use crate::error::{GmsError, GmsResult};
use gms_core::{GmsConfig, ImageSize, Keypoint, Match};
use log::debug;
use rayon::prelude::*;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};
use std::time::Instant;

/// Multiplier on the expected neighbourhood support
pub const THRESHOLD_FACTOR: f64 = 6.0;

/// Cells per side of the left grid
const LEFT_GRID: usize = 20;

/// Right grid side relative to the left one
const SCALE_RATIOS: [f64; 5] = [1.0, 0.5, FRAC_1_SQRT_2, SQRT_2, 2.0];

/// Neighbour `j` of a left cell is compared against neighbour `pattern[j]`
/// of its right cell. Neighbours are numbered row-major from the top-left.
const ROTATION_PATTERNS: [[usize; 9]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [3, 0, 1, 6, 4, 2, 7, 8, 5],
    [6, 3, 0, 7, 4, 1, 8, 5, 2],
    [7, 6, 3, 8, 4, 0, 5, 2, 1],
    [8, 7, 6, 5, 4, 3, 2, 1, 0],
    [5, 8, 7, 2, 4, 6, 1, 0, 3],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
    [1, 2, 5, 0, 4, 8, 3, 6, 7],
];

/// Half-cell offsets of the four left grids
const GRID_SHIFTS: [(f64, f64); 4] = [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)];

type Neighbourhood = [Option<usize>; 9];

/// Square grid over normalised [0, 1) coordinates
struct Grid {
    side: usize,
    neighbours: Vec<Neighbourhood>,
}

impl Grid {
    fn new(side: usize) -> Self {
        let side = side.max(1);
        let neighbours = (0..side * side).map(|cell| Self::neighbourhood(cell, side)).collect();
        Self { side, neighbours }
    }

    fn cells(&self) -> usize {
        self.side * self.side
    }

    fn neighbourhood(cell: usize, side: usize) -> Neighbourhood {
        let (cx, cy) = ((cell % side) as isize, (cell / side) as isize);
        let side = side as isize;
        let mut nb = [None; 9];
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                let (x, y) = (cx + dx, cy + dy);
                if (0..side).contains(&x) && (0..side).contains(&y) {
                    nb[(dx + 4 + dy * 3) as usize] = Some((x + y * side) as usize);
                }
            }
        }
        nb
    }

    /// Cell of a point on a grid shifted by `shift` cells; `None` past the
    /// far edge
    fn shifted_cell(&self, (x, y): (f64, f64), shift: (f64, f64)) -> Option<usize> {
        let side = self.side as f64;
        let gx = (x * side + shift.0).floor();
        let gy = (y * side + shift.1).floor();
        if gx < 0.0 || gy < 0.0 || gx >= side || gy >= side {
            return None;
        }
        Some(gx as usize + gy as usize * self.side)
    }

    /// Cell of a point, clamped into the grid
    fn clamped_cell(&self, (x, y): (f64, f64)) -> usize {
        let max = (self.side - 1) as f64;
        let side = self.side as f64;
        let gx = (x * side).floor().clamp(0.0, max) as usize;
        let gy = (y * side).floor().clamp(0.0, max) as usize;
        gx + gy * self.side
    }
}

/// One GMS problem: two normalised point sets and the candidates between them
pub struct GmsMatcher {
    left: Vec<(f64, f64)>,
    right: Vec<(f64, f64)>,
    /// (query, train) per candidate
    pairs: Vec<(usize, usize)>,
    left_grid: Grid,
}

impl GmsMatcher {
    /// Validate the candidates against both keypoint sets and image sizes
    pub fn new(
        size1: ImageSize,
        size2: ImageSize,
        kp1: &[Keypoint],
        kp2: &[Keypoint],
        candidates: &[Match],
    ) -> GmsResult<Self> {
        for (which, size) in [(1u8, size1), (2, size2)] {
            if size.is_empty() {
                return Err(GmsError::EmptyImage {
                    which,
                    width: size.width,
                    height: size.height,
                });
            }
        }

        for (position, m) in candidates.iter().enumerate() {
            if m.query_idx >= kp1.len() {
                return Err(GmsError::QueryIndexOutOfRange {
                    position,
                    index: m.query_idx,
                    len: kp1.len(),
                });
            }
            if m.train_idx >= kp2.len() {
                return Err(GmsError::TrainIndexOutOfRange {
                    position,
                    index: m.train_idx,
                    len: kp2.len(),
                });
            }
        }

        Ok(Self {
            left: normalize(kp1, size1),
            right: normalize(kp2, size2),
            pairs: candidates.iter().map(|m| (m.query_idx, m.train_idx)).collect(),
            left_grid: Grid::new(LEFT_GRID),
        })
    }

    /// Inlier flag per candidate and the inlier count.
    ///
    /// Every requested (scale, rotation) combination is scored; the one
    /// with most inliers wins and the earliest wins ties.
    pub fn inlier_mask(&self, config: GmsConfig) -> (Vec<bool>, usize) {
        let no_inliers = (vec![false; self.pairs.len()], 0);
        if self.pairs.is_empty() {
            return no_inliers;
        }

        let scales = if config.scale { SCALE_RATIOS.len() } else { 1 };
        let rotations = if config.rotation { ROTATION_PATTERNS.len() } else { 1 };
        let combos: Vec<(usize, usize)> = (0..scales)
            .flat_map(|s| (0..rotations).map(move |r| (s, r)))
            .collect();

        let start = Instant::now();
        let results: Vec<(Vec<bool>, usize)> = combos
            .par_iter()
            .map(|&(scale, rotation)| {
                let side = (LEFT_GRID as f64 * SCALE_RATIOS[scale]) as usize;
                self.run(&Grid::new(side), &ROTATION_PATTERNS[rotation])
            })
            .collect();

        let mut best = no_inliers;
        let mut winner = None;
        for (combo, result) in combos.iter().zip(results) {
            if result.1 > best.1 {
                best = result;
                winner = Some(*combo);
            }
        }
        debug!(
            "gms {}: {} of {} candidates kept, best (scale, rotation) {:?}, {} combinations in {:.2?}",
            config,
            best.1,
            self.pairs.len(),
            winner,
            combos.len(),
            start.elapsed()
        );
        best
    }

    /// Inliers for a single right grid and rotation pattern, accumulated
    /// over the four shifted left grids
    fn run(&self, right_grid: &Grid, pattern: &[usize; 9]) -> (Vec<bool>, usize) {
        let left_cells = self.left_grid.cells();
        let right_cells = right_grid.cells();

        let mut mask = vec![false; self.pairs.len()];
        let mut motion = vec![0u32; left_cells * right_cells];
        let mut per_left = vec![0u32; left_cells];
        let mut cell_pairs: Vec<Option<usize>> = vec![None; left_cells];

        // The right grid is never shifted
        let right_of: Vec<usize> = self
            .pairs
            .iter()
            .map(|&(_, t)| right_grid.clamped_cell(self.right[t]))
            .collect();

        for &shift in &GRID_SHIFTS {
            motion.fill(0);
            per_left.fill(0);

            let left_of: Vec<Option<usize>> = self
                .pairs
                .iter()
                .map(|&(q, _)| self.left_grid.shifted_cell(self.left[q], shift))
                .collect();

            for (l, &r) in left_of.iter().zip(&right_of) {
                if let Some(l) = *l {
                    motion[l * right_cells + r] += 1;
                    per_left[l] += 1;
                }
            }

            self.verify_cell_pairs(right_grid, pattern, &motion, &per_left, &mut cell_pairs);

            for (i, (l, &r)) in left_of.iter().zip(&right_of).enumerate() {
                if let Some(l) = *l {
                    if cell_pairs[l] == Some(r) {
                        mask[i] = true;
                    }
                }
            }
        }

        let count = mask.iter().filter(|&&inlier| inlier).count();
        (mask, count)
    }

    /// Pair every left cell with its most supported right cell and drop the
    /// pairs whose neighbourhood support is below threshold
    fn verify_cell_pairs(
        &self,
        right_grid: &Grid,
        pattern: &[usize; 9],
        motion: &[u32],
        per_left: &[u32],
        cell_pairs: &mut [Option<usize>],
    ) {
        let right_cells = right_grid.cells();

        for (l, pair) in cell_pairs.iter_mut().enumerate() {
            if per_left[l] == 0 {
                *pair = None;
                continue;
            }
            let row = &motion[l * right_cells..(l + 1) * right_cells];

            let mut best = None;
            let mut max = 0;
            for (r, &count) in row.iter().enumerate() {
                if count > max {
                    max = count;
                    best = Some(r);
                }
            }
            let Some(r) = best else {
                *pair = None;
                continue;
            };

            let left_nb = &self.left_grid.neighbours[l];
            let right_nb = &right_grid.neighbours[r];

            let mut score = 0u32;
            let mut support = 0u32;
            let mut neighbours = 0u32;
            for (j, ll) in left_nb.iter().enumerate() {
                if let (Some(ll), Some(rr)) = (*ll, right_nb[pattern[j]]) {
                    score += motion[ll * right_cells + rr];
                    support += per_left[ll];
                    neighbours += 1;
                }
            }

            // The centre cell always counts, so `neighbours` is at least one
            let threshold = THRESHOLD_FACTOR * (support as f64 / neighbours as f64).sqrt();
            *pair = if (score as f64) < threshold { None } else { Some(r) };
        }
    }
}

fn normalize(kps: &[Keypoint], size: ImageSize) -> Vec<(f64, f64)> {
    let (w, h) = (size.width as f64, size.height as f64);
    kps.iter().map(|kp| (kp.x as f64 / w, kp.y as f64 / h)).collect()
}

/// Keep the candidates supported by grid motion statistics.
///
/// The result is the inlier subsequence of `candidates`, in input order.
pub fn match_gms(
    size1: ImageSize,
    size2: ImageSize,
    kp1: &[Keypoint],
    kp2: &[Keypoint],
    candidates: &[Match],
    config: GmsConfig,
) -> GmsResult<Vec<Match>> {
    let matcher = GmsMatcher::new(size1, size2, kp1, kp2, candidates)?;
    let (mask, _) = matcher.inlier_mask(config);

    Ok(candidates
        .iter()
        .zip(mask)
        .filter_map(|(m, inlier)| inlier.then_some(*m))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIDE: u32 = 400;

    /// Four points in every 20x20 cell of a 400x400 image, cell by cell
    fn lattice() -> Vec<Keypoint> {
        let mut kps = Vec::new();
        for cy in 0..20 {
            for cx in 0..20 {
                for (ox, oy) in [(5.0, 5.0), (15.0, 5.0), (5.0, 15.0), (15.0, 15.0)] {
                    kps.push(Keypoint::new(cx as f32 * 20.0 + ox, cy as f32 * 20.0 + oy));
                }
            }
        }
        kps
    }

    /// Correct pairs followed by one far-off pair from every fourth cell
    fn candidates_with_outliers(n: usize) -> (Vec<Match>, Vec<Match>) {
        let correct: Vec<Match> = (0..n).map(|i| Match::new(i, i, 0)).collect();
        let outliers: Vec<Match> = (0..n / 16).map(|j| Match::new(j * 16, (j * 16 + n / 2) % n, 40)).collect();
        (correct, outliers)
    }

    fn size() -> ImageSize {
        ImageSize::new(SIDE, SIDE)
    }

    #[test]
    fn test_neighbourhood_layout() {
        let nb = Grid::neighbourhood(0, 20);
        assert_eq!(nb, [None, None, None, None, Some(0), Some(1), None, Some(20), Some(21)]);

        let nb = Grid::neighbourhood(21, 20);
        assert_eq!(nb[0], Some(0));
        assert_eq!(nb[4], Some(21));
        assert_eq!(nb[8], Some(42));
    }

    #[test]
    fn test_shifted_cells() {
        let grid = Grid::new(20);
        assert_eq!(grid.shifted_cell((0.0, 0.0), (0.0, 0.0)), Some(0));
        assert_eq!(grid.shifted_cell((0.99, 0.0), (0.0, 0.0)), Some(19));
        assert_eq!(grid.shifted_cell((0.99, 0.0), (0.5, 0.0)), None);
        assert_eq!(grid.shifted_cell((0.0, 0.99), (0.0, 0.5)), None);
        assert_eq!(grid.shifted_cell((0.03, 0.03), (0.5, 0.5)), Some(21));
        assert_eq!(grid.clamped_cell((1.0, 1.0)), 399);
    }

    #[test]
    fn test_right_grid_sides() {
        let sides: Vec<usize> = SCALE_RATIOS.iter().map(|r| (LEFT_GRID as f64 * r) as usize).collect();
        assert_eq!(sides, vec![20, 10, 14, 28, 40]);
    }

    #[test]
    fn test_identity_motion_keeps_correct_pairs() {
        let kps = lattice();
        let (correct, outliers) = candidates_with_outliers(kps.len());
        let candidates: Vec<Match> = correct.iter().chain(&outliers).copied().collect();

        for config in [GmsConfig::new(false, false), GmsConfig::new(true, true), GmsConfig::new(false, true)] {
            let kept = match_gms(size(), size(), &kps, &kps, &candidates, config).unwrap();
            assert_eq!(kept, correct, "config {}", config);
        }
    }

    #[test]
    fn test_rotation_needs_rotation_support() {
        let left = lattice();
        // 90 degrees clockwise
        let right: Vec<Keypoint> = left
            .iter()
            .map(|kp| Keypoint::new(SIDE as f32 - 1.0 - kp.y, kp.x))
            .collect();
        let candidates: Vec<Match> = (0..left.len()).map(|i| Match::new(i, i, 0)).collect();

        let plain = match_gms(size(), size(), &left, &right, &candidates, GmsConfig::new(false, false)).unwrap();
        assert!(plain.is_empty(), "kept {}", plain.len());

        let rotated = match_gms(size(), size(), &left, &right, &candidates, GmsConfig::new(true, false)).unwrap();
        assert_eq!(rotated, candidates);
    }

    #[test]
    fn test_coordinates_are_normalised_per_image() {
        let left = lattice();
        // Right image is twice as large with the content stretched to fit
        let right: Vec<Keypoint> = left.iter().map(|kp| Keypoint::new(kp.x * 2.0, kp.y * 2.0)).collect();
        let candidates: Vec<Match> = (0..left.len()).map(|i| Match::new(i, i, 0)).collect();
        let big = ImageSize::new(SIDE * 2, SIDE * 2);

        let kept = match_gms(size(), big, &left, &right, &candidates, GmsConfig::new(false, true)).unwrap();
        assert_eq!(kept, candidates);
    }

    #[test]
    fn test_output_is_ordered_subsequence() {
        let kps = lattice();
        let (correct, outliers) = candidates_with_outliers(kps.len());
        // Interleave so order preservation is visible
        let mut candidates = Vec::new();
        for (i, m) in correct.iter().enumerate() {
            candidates.push(*m);
            if let Some(o) = outliers.get(i) {
                candidates.push(*o);
            }
        }

        let kept = match_gms(size(), size(), &kps, &kps, &candidates, GmsConfig::default()).unwrap();
        let mut it = candidates.iter();
        for m in &kept {
            assert!(it.any(|c| c == m), "{:?} out of order", m);
        }
    }

    #[test]
    fn test_empty_candidates() {
        let kps = lattice();
        let kept = match_gms(size(), size(), &kps, &kps, &[], GmsConfig::new(true, true)).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let kps = vec![Keypoint::new(1.0, 1.0)];
        let ok = [Match::new(0, 0, 0)];

        assert_eq!(
            match_gms(ImageSize::new(0, 5), size(), &kps, &kps, &ok, GmsConfig::default()),
            Err(GmsError::EmptyImage { which: 1, width: 0, height: 5 })
        );
        assert_eq!(
            match_gms(size(), ImageSize::new(5, 0), &kps, &kps, &ok, GmsConfig::default()),
            Err(GmsError::EmptyImage { which: 2, width: 5, height: 0 })
        );
        assert_eq!(
            match_gms(size(), size(), &kps, &kps, &[Match::new(0, 0, 0), Match::new(3, 0, 0)], GmsConfig::default()),
            Err(GmsError::QueryIndexOutOfRange { position: 1, index: 3, len: 1 })
        );
        assert_eq!(
            match_gms(size(), size(), &kps, &kps, &[Match::new(0, 2, 0)], GmsConfig::default()),
            Err(GmsError::TrainIndexOutOfRange { position: 0, index: 2, len: 1 })
        );
    }
}
