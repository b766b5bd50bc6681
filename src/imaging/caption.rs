//! Caption compositing: measure text, place it, blend it onto the canvas.
//!
//! Outline fonts are laid out with `rusttype` (kerning included) and
//! rasterized glyph by glyph; coverage is alpha-blended in the font color.
//! Without any font file, [`CaptionFont::Blocks`] draws one filled
//! rectangle per character (dashes and apostrophes get their own shapes) so
//! a caption is still visible.

use super::calculations::{CaptionAnchor, caption_position};
use super::fonts::CaptionFont;
use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};

/// Rendered extent of a caption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Measure `text` at `size` pixels.
///
/// Width is the advance of the laid-out string; height is the font's line
/// height (ascent − descent + line gap).
pub fn measure(font: &CaptionFont, text: &str, size: f32) -> TextSize {
    match font {
        CaptionFont::Outline(font) => {
            let scale = Scale::uniform(size);
            let v = font.v_metrics(scale);
            let width = font
                .layout(text, scale, point(0.0, v.ascent))
                .last()
                .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                .unwrap_or(0.0);
            TextSize {
                width,
                height: v.ascent - v.descent + v.line_gap,
            }
        }
        CaptionFont::Blocks => {
            let char_width = (size / 2.0).floor();
            TextSize {
                width: char_width * text.chars().count() as f32,
                height: size.floor(),
            }
        }
    }
}

/// Burn `text` into `canvas` at the position dictated by `anchor`.
///
/// Returns the canvas unchanged when `text` is empty. Glyph pixels that fall
/// outside the canvas are clipped.
pub fn composite(
    mut canvas: RgbaImage,
    text: &str,
    font: &CaptionFont,
    size: f32,
    color: Rgba<u8>,
    anchor: &CaptionAnchor,
) -> RgbaImage {
    if text.is_empty() || size <= 0.0 {
        return canvas;
    }
    let extent = measure(font, text, size);
    let (x, baseline) = caption_position(anchor, extent.width, extent.height);
    let top = baseline - extent.height;

    match font {
        CaptionFont::Outline(font) => draw_outline(&mut canvas, font, size, x, top, color, text),
        CaptionFont::Blocks => draw_blocks(&mut canvas, size, x, top, color, text),
    }
    canvas
}

fn draw_outline(
    canvas: &mut RgbaImage,
    font: &Font<'static>,
    size: f32,
    x: f32,
    top: f32,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = Scale::uniform(size);
    let v = font.v_metrics(scale);
    let origin = point(x.round(), (top + v.ascent).round());

    for glyph in font.layout(text, scale, origin) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x as i64 + gx as i64;
            let py = bb.min.y as i64 + gy as i64;
            blend_at(canvas, px, py, color, coverage);
        });
    }
}

fn draw_blocks(canvas: &mut RgbaImage, size: f32, x: f32, top: f32, color: Rgba<u8>, text: &str) {
    let char_width = (size / 2.0).floor() as i64;
    let height = size.floor() as i64;
    let glyph_width = (char_width as f32 * 0.8) as i64;
    let (x, top) = (x.round() as i64, top.round() as i64);
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

    for (i, ch) in text.chars().enumerate() {
        let left = x + i as i64 * char_width;
        let (x_range, y_range) = match ch {
            c if c.is_whitespace() => continue,
            '-' => {
                let mid = top + height / 2;
                (left..left + glyph_width, mid - 2..mid + 3)
            }
            '\'' => (
                left + glyph_width / 3..left + 2 * glyph_width / 3,
                top..top + height / 3,
            ),
            _ => (left..left + glyph_width, top..top + height),
        };
        let x_range = x_range.start.max(0)..x_range.end.min(canvas_w);
        let y_range = y_range.start.max(0)..y_range.end.min(canvas_h);
        for py in y_range {
            for px in x_range.clone() {
                blend_at(canvas, px, py, color, 1.0);
            }
        }
    }
}

/// Source-over blend of `color` at `coverage` into one pixel, clipped.
fn blend_at(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let src_a = coverage.clamp(0.0, 1.0) * color[3] as f32 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for c in 0..3 {
        let blended = (color[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}
