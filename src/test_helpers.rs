//! Shared test utilities for the framer test suite.
//!
//! Synthetic photos are generated in code. The one fixture file is a bundled
//! outline font, so rusttype rendering is tested on hosts without fonts.
//! EXIF blocks are assembled by hand (little-endian TIFF) to exercise
//! the capture-date path end to end.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = write_photo(tmp.path(), "dawn.jpg", 64, 48, Some("2024:07:15 08:00:00"));
//! let source = SourceImage::open(&path).unwrap();
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::imaging::FontCatalog;

// =========================================================================
// Pixels
// =========================================================================

/// Opaque gradient, distinct per pixel so misplacements show up in asserts.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

/// Single-color opaque image.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// A catalog that knows no fonts, forcing the block-glyph fallback.
pub fn empty_catalog() -> FontCatalog {
    FontCatalog::from_dirs(&[])
}

/// Identifier of the bundled font under `tests/fixtures/fonts`.
pub const FIXTURE_FONT: &str = "DejaVuSansMono-Bold";

pub fn fixture_fonts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts")
}

/// A catalog holding only the bundled font, independent of the host.
pub fn fixture_catalog() -> FontCatalog {
    FontCatalog::from_dirs(&[fixture_fonts_dir()])
}

// =========================================================================
// Encoding
// =========================================================================

/// Encode as baseline JPEG (quality 90), dropping alpha.
pub fn encode_jpeg(img: &RgbaImage) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&rgb)
        .unwrap();
    buf
}

/// Build a little-endian TIFF block with optional DateTimeOriginal (in an
/// Exif sub-IFD) and optional IFD0 DateTime. Strings are placed after the
/// IFDs, DateTimeOriginal last.
pub fn exif_tiff_block(original: Option<&str>, date_time: Option<&str>) -> Vec<u8> {
    fn ascii(value: &str) -> Vec<u8> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        bytes
    }
    fn entry(out: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&typ.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }

    let date_time = date_time.map(ascii);
    let original = original.map(ascii);

    let ifd0_count = date_time.is_some() as u32 + original.is_some() as u32;
    let ifd0_len = 2 + 12 * ifd0_count + 4;
    let exif_ifd_offset = 8 + ifd0_len;
    let exif_ifd_len = if original.is_some() { 2 + 12 + 4 } else { 0 };
    let mut data_offset = exif_ifd_offset + exif_ifd_len;

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    // IFD0, tags ascending
    out.extend_from_slice(&(ifd0_count as u16).to_le_bytes());
    let date_time_offset = data_offset;
    if let Some(dt) = &date_time {
        entry(&mut out, 0x0132, 2, dt.len() as u32, date_time_offset);
        data_offset += dt.len() as u32;
    }
    if original.is_some() {
        entry(&mut out, 0x8769, 4, 1, exif_ifd_offset);
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    // Exif sub-IFD
    if let Some(orig) = &original {
        out.extend_from_slice(&1u16.to_le_bytes());
        entry(&mut out, 0x9003, 2, orig.len() as u32, data_offset);
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    if let Some(dt) = &date_time {
        out.extend_from_slice(dt);
    }
    if let Some(orig) = &original {
        out.extend_from_slice(orig);
    }
    out
}

/// Encode `img` as JPEG with an EXIF APP1 segment right after SOI.
pub fn jpeg_with_exif(img: &RgbaImage, original: Option<&str>, date_time: Option<&str>) -> Vec<u8> {
    let jpeg = encode_jpeg(img);
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&exif_tiff_block(original, date_time));

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a gradient JPEG into `dir`, with a DateTimeOriginal when given.
pub fn write_photo(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    taken: Option<&str>,
) -> PathBuf {
    let img = gradient_image(width, height);
    let bytes = match taken {
        Some(date) => jpeg_with_exif(&img, Some(date), None),
        None => encode_jpeg(&img),
    };
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}
