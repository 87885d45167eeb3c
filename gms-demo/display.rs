use image::RgbImage;
use log::debug;
use thiserror::Error;

/// Window failures. None of them stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("no display available: {0}")]
    Unavailable(String),

    #[error("refusing to show empty image in window '{0}'")]
    EmptyImage(String),

    #[error("window error: {0}")]
    Window(String),

    #[error("surface error: {0}")]
    Surface(String),
}

/// Named image windows
pub trait DisplaySurface {
    /// Show `image` in the window called `name`, creating it on first use
    fn show(&mut self, name: &str, image: &RgbImage) -> Result<(), DisplayError>;

    /// Block until the user acknowledges the open windows
    fn wait_for_user(&mut self) -> Result<(), DisplayError>;

    /// Close every window opened so far
    fn close_all(&mut self);
}

/// Headless surface that remembers what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub shown: Vec<(String, RgbImage)>,
    pub waits: usize,
    pub closes: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window names in the order they were shown
    pub fn names(&self) -> Vec<&str> {
        self.shown.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl DisplaySurface for RecordingSurface {
    fn show(&mut self, name: &str, image: &RgbImage) -> Result<(), DisplayError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DisplayError::EmptyImage(name.to_string()));
        }
        debug!("recorded '{}' ({}x{})", name, image.width(), image.height());
        self.shown.push((name.to_string(), image.clone()));
        Ok(())
    }

    fn wait_for_user(&mut self) -> Result<(), DisplayError> {
        self.waits += 1;
        Ok(())
    }

    fn close_all(&mut self) {
        self.closes += 1;
    }
}
