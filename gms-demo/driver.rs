use crate::config::DemoConfig;
use crate::display::DisplaySurface;
use crate::error::DemoError;
use crate::extract::{create_extractor, extract_features, ExtractError, Features};
use crate::image_io::{load, Frame};
use crate::render::draw_matches;
use gms_core::GmsConfig;
use gms_match::{match_gms, BruteForceMatcher};
use image::RgbImage;
use log::{info, warn};
use std::io::Write;
use std::time::Instant;

/// Keypoint budget per image
pub const MAX_FEATURES: usize = 10_000;

pub const DETECTOR: &str = "orb";

pub const FIRST_IMAGE: &str = "dog01.jpg";
pub const SECOND_IMAGE: &str = "dog02.jpg";

pub const FIRST_WINDOW: &str = "Dog01 Image";
pub const SECOND_WINDOW: &str = "Dog02 Image";

/// GMS configurations in the order they are run, with their window names
pub const GMS_RUNS: [(GmsConfig, &str); 3] = [
    (GmsConfig::new(false, false), "GMS No Rotation or Scale Support"),
    (GmsConfig::new(true, true), "GMS with Rotation and Scale Support"),
    (GmsConfig::new(false, true), "GMS with Scale Support and No Rotation"),
];

/// What one pipeline pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub keypoints: (usize, usize),
    pub candidates: usize,
    /// Surviving matches per entry of [`GMS_RUNS`]
    pub gms_sizes: Vec<usize>,
}

/// Run the whole demo.
///
/// Progress lines go to `out`, images to `surface`. Every window is closed
/// before returning, whether or not the run succeeded.
pub fn run<S, W>(config: &DemoConfig, surface: &mut S, out: &mut W) -> Result<RunReport, DemoError>
where
    S: DisplaySurface + ?Sized,
    W: Write,
{
    let result = run_pipeline(config, surface, out);
    surface.close_all();
    result
}

fn run_pipeline<S, W>(config: &DemoConfig, surface: &mut S, out: &mut W) -> Result<RunReport, DemoError>
where
    S: DisplaySurface + ?Sized,
    W: Write,
{
    config.validate()?;
    let start = Instant::now();

    let first = load(&config.first_image);
    let second = load(&config.second_image);
    let (img1, img2) = match (first.rgb(), second.rgb()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(DemoError::InputMissing {
                first: config.first_image.clone(),
                second: config.second_image.clone(),
            })
        }
    };

    show(surface, FIRST_WINDOW, img1);
    show(surface, SECOND_WINDOW, img2);

    let features1 = extract(config, &config.first_image, &first, out)?;
    let features2 = extract(config, &config.second_image, &second, out)?;

    let candidates = BruteForceMatcher::new(false).match_descriptors(&features1.descriptors, &features2.descriptors);
    info!(
        "{} candidate matches between {} and {} keypoints",
        candidates.len(),
        features1.len(),
        features2.len()
    );

    let mut gms_sizes = Vec::with_capacity(GMS_RUNS.len());
    for (gms_config, window) in GMS_RUNS {
        let kept = match_gms(
            first.size(),
            second.size(),
            &features1.keypoints,
            &features2.keypoints,
            &candidates,
            gms_config,
        )?;
        writeln!(out, "MatchGMS Size: {}", kept.len())?;
        out.flush()?;

        let canvas = draw_matches(img1, &features1.keypoints, img2, &features2.keypoints, &kept);
        show(surface, window, &canvas);
        if let Err(err) = surface.wait_for_user() {
            warn!("not waiting on '{}': {}", window, err);
        }
        gms_sizes.push(kept.len());
    }

    info!("pipeline finished in {:.2?}", start.elapsed());
    Ok(RunReport {
        keypoints: (features1.len(), features2.len()),
        candidates: candidates.len(),
        gms_sizes,
    })
}

fn extract<W: Write>(
    config: &DemoConfig,
    path: &std::path::Path,
    frame: &Frame,
    out: &mut W,
) -> Result<Features, DemoError> {
    let extractor = create_extractor(&config.detector, config.max_features)
        .ok_or_else(|| DemoError::DetectorUnknown(config.detector.clone()))?;
    writeln!(out, "Detecting keypoints for input image: {}", path.display())?;
    extract_features(extractor.as_ref(), frame).map_err(|err| match err {
        ExtractError::DetectorUnknown(tag) => DemoError::DetectorUnknown(tag),
        ExtractError::Extraction { detector, reason } => DemoError::ExtractionFailure {
            detector: detector.to_string(),
            reason,
        },
    })
}

/// Display failures are reported and skipped
fn show<S: DisplaySurface + ?Sized>(surface: &mut S, name: &str, image: &RgbImage) {
    if let Err(err) = surface.show(name, image) {
        warn!("skipping window '{}': {}", name, err);
    }
}
