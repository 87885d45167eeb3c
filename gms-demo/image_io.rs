use gms_core::ImageSize;
use image::{GrayImage, ImageReader, RgbImage};
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },

    #[error("cannot decode {}: {source}", path.display())]
    Decode { path: PathBuf, source: image::ImageError },

    #[error("{} decoded to an empty image", path.display())]
    Empty { path: PathBuf },
}

/// A decoded image, or nothing.
///
/// A frame either holds RGB pixels with both sides positive or is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    image: Option<RgbImage>,
}

impl Frame {
    pub fn empty() -> Self {
        Self { image: None }
    }

    /// Wrap decoded pixels; zero-area images become empty frames
    pub fn from_rgb(image: RgbImage) -> Self {
        if image.width() == 0 || image.height() == 0 {
            return Self::empty();
        }
        Self { image: Some(image) }
    }

    pub fn is_valid(&self) -> bool {
        self.image.is_some()
    }

    pub fn rgb(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn to_gray(&self) -> Option<GrayImage> {
        self.image.as_ref().map(|img| image::imageops::grayscale(img))
    }

    pub fn size(&self) -> ImageSize {
        match &self.image {
            Some(img) => ImageSize::new(img.width(), img.height()),
            None => ImageSize::new(0, 0),
        }
    }
}

/// Decode `path`, sniffing the format from its content
pub fn try_load(path: impl AsRef<Path>) -> Result<Frame, LoadError> {
    let path = path.as_ref();
    let open_err = |source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    };

    let decoded = ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?
        .decode()
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let frame = Frame::from_rgb(decoded.to_rgb8());
    if !frame.is_valid() {
        return Err(LoadError::Empty { path: path.to_path_buf() });
    }
    Ok(frame)
}

/// Decode `path`; any failure gives an empty frame
pub fn load(path: impl AsRef<Path>) -> Frame {
    match try_load(path) {
        Ok(frame) => frame,
        Err(err) => {
            debug!("{}", err);
            Frame::empty()
        }
    }
}
