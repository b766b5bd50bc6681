//! Frame rendering for both border styles.
//!
//! | Style | Canvas | Steps |
//! |---|---|---|
//! | Solid | source + 2×(thickness + padding) | border color, then white padding |
//! | Instagram | fixed 1080×1350 | resize (Lanczos3), white padding, border color, center |
//!
//! Pixels are copied, not blended: a translucent border color stays
//! translucent in the output, exactly as specified.
//!
//! Surfaces are size-checked before allocation. When a surface would
//! overflow or exceed [`MAX_CANVAS_PIXELS`](super::calculations::MAX_CANVAS_PIXELS),
//! rendering degrades instead of failing: the solid style yields an empty
//! (0×0) image, the instagram style its blank white canvas.

use super::calculations::{
    INSTAGRAM_CANVAS, Rect, center_offset, fits_in_memory, grow, instagram_photo_rect,
    instagram_scale, scaled_dimensions,
};
use crate::settings::FrameStyle;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::warn;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A framed canvas and, for the instagram style, where the photo sits on it.
#[derive(Debug, Clone)]
pub struct FramedCanvas {
    pub canvas: RgbaImage,
    pub photo_rect: Option<Rect>,
}

/// Render `source` in the given style.
pub fn render(source: &RgbaImage, style: &FrameStyle, border_color: Rgba<u8>) -> FramedCanvas {
    match *style {
        FrameStyle::Solid { thickness, padding } => FramedCanvas {
            canvas: render_solid(source, thickness, border_color, padding),
            photo_rect: None,
        },
        FrameStyle::Instagram {
            thickness,
            padding,
            max_size,
        } => {
            let (canvas, rect) =
                render_instagram(source, max_size, thickness, border_color, padding);
            FramedCanvas {
                canvas,
                photo_rect: Some(rect),
            }
        }
    }
}

/// Solid mat: `thickness` of `color` around the photo, then `padding` of white.
pub fn render_solid(source: &RgbaImage, thickness: u32, color: Rgba<u8>, padding: u32) -> RgbaImage {
    let framed = surround(source, thickness, color).and_then(|bordered| {
        if padding > 0 {
            surround(&bordered, padding, WHITE)
        } else {
            Some(bordered)
        }
    });
    framed.unwrap_or_else(|| {
        warn!(
            width = source.width(),
            height = source.height(),
            thickness,
            padding,
            "solid frame too large to allocate, returning empty image"
        );
        RgbaImage::new(0, 0)
    })
}

/// Instagram frame: photo scaled into a `max_size` square, padded, bordered
/// and centered on a 1080×1350 white canvas.
///
/// Returns the canvas and the rectangle occupied by the resized photo.
pub fn render_instagram(
    source: &RgbaImage,
    max_size: u32,
    thickness: u32,
    color: Rgba<u8>,
    padding: u32,
) -> (RgbaImage, Rect) {
    let mut canvas = RgbaImage::from_pixel(INSTAGRAM_CANVAS.0, INSTAGRAM_CANVAS.1, WHITE);

    let scale = instagram_scale(source.dimensions(), max_size);
    let resized_dims = scaled_dimensions(source.dimensions(), scale);
    let rect = instagram_photo_rect(resized_dims, thickness, padding);

    let block = grow(resized_dims, thickness)
        .and_then(|d| grow(d, padding))
        .filter(|&d| fits_in_memory(d));
    if block.is_none() {
        warn!(
            width = resized_dims.0,
            height = resized_dims.1,
            max_size,
            "instagram frame too large to allocate, returning blank canvas"
        );
        return (canvas, rect);
    }

    let resized = imageops::resize(source, resized_dims.0, resized_dims.1, FilterType::Lanczos3);
    let padded = if padding > 0 {
        surround(&resized, padding, WHITE)
    } else {
        Some(resized)
    };
    let Some(bordered) = padded.and_then(|p| surround(&p, thickness, color)) else {
        return (canvas, rect);
    };

    let (x, y) = center_offset(INSTAGRAM_CANVAS, bordered.dimensions());
    imageops::replace(&mut canvas, &bordered, x, y);
    (canvas, rect)
}

/// New surface of `fill` with `inner` copied in at offset `margin`.
///
/// `None` when the surface cannot be allocated.
fn surround(inner: &RgbaImage, margin: u32, fill: Rgba<u8>) -> Option<RgbaImage> {
    let dims = grow(inner.dimensions(), margin).filter(|&d| fits_in_memory(d))?;
    let mut out = RgbaImage::from_pixel(dims.0, dims.1, fill);
    imageops::replace(&mut out, inner, margin as i64, margin as i64);
    Some(out)
}
