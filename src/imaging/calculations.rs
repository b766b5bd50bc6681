//! Pure geometry for frames and captions.
//!
//! All functions here are pure and testable without any pixels.

/// Output size of the instagram style (4:5 portrait).
pub const INSTAGRAM_CANVAS: (u32, u32) = (1080, 1350);

/// Largest surface the renderer will allocate, in pixels (1 GiB of RGBA).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// An axis-aligned rectangle in output-image coordinates.
///
/// The origin may be negative when content is larger than the canvas it is
/// centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }
}

/// Size of `inner` grown by `margin` on every side, or `None` on overflow.
pub fn grow(inner: (u32, u32), margin: u32) -> Option<(u32, u32)> {
    let twice = margin.checked_mul(2)?;
    Some((inner.0.checked_add(twice)?, inner.1.checked_add(twice)?))
}

/// Whether a surface of this size may be allocated.
pub fn fits_in_memory((width, height): (u32, u32)) -> bool {
    width as u64 * height as u64 <= MAX_CANVAS_PIXELS
}

/// Final canvas size of the solid style: border, then padding.
///
/// ```text
/// thickness=20, padding=150, 600x400 source → 940x740
/// ```
pub fn solid_canvas_size(source: (u32, u32), thickness: u32, padding: u32) -> Option<(u32, u32)> {
    grow(grow(source, thickness)?, padding)
}

/// Uniform scale that fits the source inside a `max_size` square.
///
/// Not clamped: a source smaller than `max_size` is scaled up.
pub fn instagram_scale((width, height): (u32, u32), max_size: u32) -> f64 {
    let scale_w = max_size as f64 / width as f64;
    let scale_h = max_size as f64 / height as f64;
    scale_w.min(scale_h)
}

/// Source dimensions multiplied by `scale`, truncated, never below 1 px.
pub fn scaled_dimensions((width, height): (u32, u32), scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale) as u32;
    let h = (height as f64 * scale) as u32;
    (w.max(1), h.max(1))
}

/// Offset that centers `inner` on `outer`, truncating toward zero.
pub fn center_offset(outer: (u32, u32), inner: (u32, u32)) -> (i64, i64) {
    (
        (outer.0 as i64 - inner.0 as i64) / 2,
        (outer.1 as i64 - inner.1 as i64) / 2,
    )
}

/// Where the resized photo lands on the instagram canvas.
///
/// The bordered block (photo + padding + border) is centered on the canvas;
/// the photo itself starts `thickness + padding` inside that block.
pub fn instagram_photo_rect(resized: (u32, u32), thickness: u32, padding: u32) -> Rect {
    let inset = thickness as i64 + padding as i64;
    let block = (
        resized.0 as i64 + 2 * inset,
        resized.1 as i64 + 2 * inset,
    );
    let x = (INSTAGRAM_CANVAS.0 as i64 - block.0) / 2;
    let y = (INSTAGRAM_CANVAS.1 as i64 - block.1) / 2;
    Rect {
        x: x + inset,
        y: y + inset,
        width: resized.0,
        height: resized.1,
    }
}

/// What a caption is positioned against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptionAnchor {
    /// Instagram: below the embedded photo rectangle.
    Photo { rect: Rect, thickness: u32 },
    /// Solid: centered in the band under the source image, located purely
    /// from border and padding offsets.
    Band {
        image: (u32, u32),
        thickness: u32,
        padding: u32,
    },
}

/// Caption placement as `(x, baseline_y)`.
///
/// Text is drawn with its top edge at `baseline_y - text_height`.
pub fn caption_position(anchor: &CaptionAnchor, text_width: f32, text_height: f32) -> (f32, f32) {
    match *anchor {
        CaptionAnchor::Photo { rect, thickness } => {
            let x = rect.x as f32 + (rect.width as f32 - text_width) / 2.0;
            let y = rect.bottom() as f32 + thickness as f32 + text_height;
            (x, y)
        }
        CaptionAnchor::Band {
            image: (width, height),
            thickness,
            padding,
        } => {
            let border = (thickness + padding) as f32;
            let x = border + (width as f32 - text_width) / 2.0;
            let y = border + height as f32 + (border - text_height) / 2.0 + text_height;
            (x, y)
        }
    }
}
