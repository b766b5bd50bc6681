//! The frame compositor: caption → frame → caption overlay.
//!
//! [`compose`] is a pure function of its inputs. The font catalog memoizes
//! parsed fonts but never changes what a given identifier resolves to, so
//! identical inputs always produce identical pixels.
//!
//! [`spawn_compose`] runs the same pipeline on a worker thread and hands
//! back a [`ComposeTask`]. There is no cancellation: a front end that starts
//! a newer composition simply drops the older handle and ignores its result.

use crate::caption;
use crate::imaging::{CaptionAnchor, FontCatalog, Rect, composite, render};
use crate::settings::{FrameSettings, FrameStyle};
use crate::source::SourceImage;
use image::RgbaImage;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("composition worker panicked")]
    WorkerPanicked,
}

/// Final framed image.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedImage {
    pub image: RgbaImage,
    /// Caption burned into the image (empty when none).
    pub caption: String,
    /// Where the photo sits on the canvas; instagram style only.
    pub photo_rect: Option<Rect>,
}

/// Frame `source` according to `settings`.
pub fn compose(source: &SourceImage, settings: &FrameSettings, fonts: &FontCatalog) -> ComposedImage {
    let caption = caption::resolve(&settings.caption, source);
    let framed = render(source.pixels(), &settings.style, settings.border_color.to_rgba());

    if caption.is_empty() || framed.canvas.width() == 0 {
        return ComposedImage {
            image: framed.canvas,
            caption,
            photo_rect: framed.photo_rect,
        };
    }

    let anchor = match (settings.style, framed.photo_rect) {
        (FrameStyle::Instagram { thickness, .. }, Some(rect)) => {
            CaptionAnchor::Photo { rect, thickness }
        }
        (style, _) => CaptionAnchor::Band {
            image: source.dimensions(),
            thickness: style.thickness(),
            padding: style.padding(),
        },
    };

    let font = fonts.caption_font(&settings.caption.font_name);
    debug!(caption = %caption, font = ?font, "compositing caption");
    let image = composite(
        framed.canvas,
        &caption,
        &font,
        settings.caption.font_size,
        settings.caption.font_color.to_rgba(),
        &anchor,
    );

    ComposedImage {
        image,
        caption,
        photo_rect: framed.photo_rect,
    }
}

/// Handle to a composition running off the caller's thread.
pub struct ComposeTask {
    handle: JoinHandle<ComposedImage>,
}

impl ComposeTask {
    /// True once the result is ready and [`wait`](Self::wait) will not block.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the composition completes.
    pub fn wait(self) -> Result<ComposedImage, ComposeError> {
        self.handle.join().map_err(|_| ComposeError::WorkerPanicked)
    }
}

/// Start composing on a background thread.
pub fn spawn_compose(
    source: Arc<SourceImage>,
    settings: FrameSettings,
    fonts: Arc<FontCatalog>,
) -> ComposeTask {
    let handle = std::thread::spawn(move || compose(&source, &settings, &fonts));
    ComposeTask { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BorderStyle, CaptionSettings};
    use crate::test_helpers::{empty_catalog, gradient_image};
    use chrono::NaiveDate;

    fn source(w: u32, h: u32, dated: bool) -> SourceImage {
        let taken = dated.then(|| {
            NaiveDate::from_ymd_opt(2024, 7, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        });
        SourceImage::new(gradient_image(w, h), taken)
    }

    fn no_caption(style: BorderStyle) -> FrameSettings {
        FrameSettings {
            caption: CaptionSettings {
                use_capture_date: false,
                ..CaptionSettings::default()
            },
            ..FrameSettings::for_style(style)
        }
    }

    #[test]
    fn no_caption_matches_plain_render() {
        let fonts = empty_catalog();
        for style in [BorderStyle::Solid, BorderStyle::Instagram] {
            let src = source(80, 60, true);
            let settings = no_caption(style);
            let composed = compose(&src, &settings, &fonts);
            let plain = render(src.pixels(), &settings.style, settings.border_color.to_rgba());
            assert_eq!(composed.caption, "");
            assert_eq!(composed.image, plain.canvas);
        }
    }

    #[test]
    fn solid_canvas_size() {
        let composed = compose(
            &source(80, 60, false),
            &FrameSettings::for_style(BorderStyle::Solid),
            &empty_catalog(),
        );
        assert_eq!(composed.image.dimensions(), (80 + 40 + 300, 60 + 40 + 300));
        assert!(composed.photo_rect.is_none());
    }

    #[test]
    fn instagram_canvas_size_and_rect() {
        let composed = compose(
            &source(400, 200, true),
            &FrameSettings::for_style(BorderStyle::Instagram),
            &empty_catalog(),
        );
        assert_eq!(composed.image.dimensions(), (1080, 1350));
        let rect = composed.photo_rect.unwrap();
        assert_eq!((rect.width, rect.height), (1000, 500));
    }

    #[test]
    fn date_caption_is_burned_in() {
        let fonts = empty_catalog();
        let src = source(80, 60, true);
        let settings = FrameSettings::for_style(BorderStyle::Solid);
        let composed = compose(&src, &settings, &fonts);
        assert_eq!(composed.caption, " - JUL '24 -");
        assert_ne!(composed.image, compose(&src, &no_caption(BorderStyle::Solid), &fonts).image);
    }

    #[test]
    fn explicit_caption_overrides_date() {
        let mut settings = FrameSettings::for_style(BorderStyle::Instagram);
        settings.caption.text = "Porto".into();
        let composed = compose(&source(50, 50, true), &settings, &empty_catalog());
        assert_eq!(composed.caption, "Porto");
    }

    #[test]
    fn compose_is_idempotent() {
        let fonts = empty_catalog();
        let src = source(120, 90, true);
        for style in [BorderStyle::Solid, BorderStyle::Instagram] {
            let settings = FrameSettings::for_style(style);
            assert_eq!(compose(&src, &settings, &fonts), compose(&src, &settings, &fonts));
        }
    }

    #[test]
    fn background_task_matches_inline_compose() {
        let fonts = Arc::new(empty_catalog());
        let src = Arc::new(source(64, 64, false));
        let settings = FrameSettings::for_style(BorderStyle::Instagram);

        let task = spawn_compose(src.clone(), settings.clone(), fonts.clone());
        let result = task.wait().unwrap();
        assert_eq!(result, compose(&src, &settings, &fonts));
        assert_eq!(result.caption, " - --- -");
    }

    #[test]
    fn background_task_can_be_polled() {
        let fonts = Arc::new(empty_catalog());
        let src = Arc::new(source(32, 24, true));
        let task = spawn_compose(src, FrameSettings::for_style(BorderStyle::Solid), fonts);

        while !task.is_finished() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(task.wait().unwrap().caption, " - JUL '24 -");
    }
}
