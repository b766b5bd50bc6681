//! Source photos: decoded pixels plus the capture timestamp.
//!
//! A [`SourceImage`] is immutable once loaded. The file is read once; the
//! same bytes feed both the decoder and the EXIF reader.

use crate::imaging::read_capture_date;
use chrono::NaiveDateTime;
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image file extensions that can be framed.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has a supported extension (case-insensitive).
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| e.eq_ignore_ascii_case(s))
        })
}

/// A decoded photo.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbaImage,
    captured_at: Option<NaiveDateTime>,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage, captured_at: Option<NaiveDateTime>) -> Self {
        Self {
            pixels,
            captured_at,
        }
    }

    /// Load and decode a photo from disk.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes).map_err(|reason| SourceError::Decode {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Decode an encoded photo, sniffing the format from its contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let pixels = image::load_from_memory(bytes)
            .map_err(|e| e.to_string())?
            .into_rgba8();
        Ok(Self::new(pixels, read_capture_date(bytes)))
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// When the photo was taken, if the file recorded it.
    pub fn captured_at(&self) -> Option<NaiveDateTime> {
        self.captured_at
    }
}
