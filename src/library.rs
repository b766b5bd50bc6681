//! Photo library sink: where finished frames are saved.
//!
//! The [`PhotoLibrary`] trait is the seam between the compositor and
//! storage. The production implementation, [`DirectoryLibrary`], writes
//! JPEGs into an output directory. [`save_in_background`] is the
//! fire-and-forget form: the save runs on a worker thread and reports once
//! through a completion callback. Failures are never retried.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

use crate::settings::BorderStyle;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding {name} failed: {reason}")]
    Encode { name: String, reason: String },
    #[error("Nothing to save: {0} is empty")]
    EmptyImage(String),
}

/// JPEG quality used when none is configured.
pub const DEFAULT_QUALITY: u8 = 95;

/// Destination for finished images.
pub trait PhotoLibrary: Sync {
    /// Store `image` under `name`, returning where it ended up.
    fn save(&self, image: &RgbaImage, name: &str) -> Result<PathBuf, SaveError>;

    /// Filesystem directory backing the library, if any. Only libraries with
    /// a location get a render cache.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// File name for a framed photo: `{stem}_framed.jpg` or `{stem}_instagram.jpg`.
pub fn output_name(stem: &str, style: BorderStyle) -> String {
    format!("{}_{}.jpg", stem, style.output_suffix())
}

/// A directory of JPEG files.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    dir: PathBuf,
    quality: u8,
}

impl DirectoryLibrary {
    pub fn new(dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl PhotoLibrary for DirectoryLibrary {
    fn save(&self, image: &RgbaImage, name: &str) -> Result<PathBuf, SaveError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SaveError::EmptyImage(name.to_string()));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8());
        let writer = BufWriter::new(std::fs::File::create(&path)?);
        let encoder = JpegEncoder::new_with_quality(writer, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| SaveError::Encode {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(path)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Save on a worker thread; `completion` runs exactly once with the outcome.
pub fn save_in_background<L, F>(
    library: Arc<L>,
    image: RgbaImage,
    name: String,
    completion: F,
) -> JoinHandle<()>
where
    L: PhotoLibrary + Send + 'static,
    F: FnOnce(Result<PathBuf, SaveError>) + Send + 'static,
{
    std::thread::spawn(move || completion(library.save(&image, &name)))
}
