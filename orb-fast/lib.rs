//! Multi-scale FAST keypoint detection for ORB features.
//!
//! Corners are found with the FAST-9 segment test on every pyramid level,
//! ranked by Harris response, capped per level by a geometric share of the
//! feature budget and oriented by intensity centroid.

pub mod builder;
pub mod config;
pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod pyramid;
pub mod refinement;
pub mod types;

pub use builder::DetectorBuilder;
pub use config::OrbConfig;
pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use types::{Corner, Detection, ScaleLevel, ScoredKeypoint};
