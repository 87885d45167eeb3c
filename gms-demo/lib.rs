//! GMS match demo: load two images, extract ORB features, match them by
//! brute force and compare three GMS filter configurations side by side.

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod extract;
pub mod image_io;
pub mod render;
#[cfg(feature = "window")]
pub mod window;

pub use config::{ConfigError, DemoConfig};
pub use display::{DisplayError, DisplaySurface, RecordingSurface};
pub use driver::{run, RunReport};
pub use error::DemoError;
pub use extract::{create_extractor, detect_and_compute, extract_features, ExtractError, FeatureExtractor, Features, OrbExtractor};
pub use image_io::{load, try_load, Frame, LoadError};
pub use render::draw_matches;
#[cfg(feature = "window")]
pub use window::WindowSurface;
