//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Capture date** | custom EXIF parser (JPEG APP1, TIFF, PNG, WebP) |
//! | **Resize** | `image::imageops::resize`, Lanczos3 |
//! | **Frame** | `image::imageops::replace` onto filled surfaces |
//! | **Caption** | `rusttype` layout + coverage blending |
//! | **Fonts** | `walkdir` over font directories |
//!
//! The module is split into:
//! - **Calculations**: pure geometry (canvas sizes, scale, anchors)
//! - **Frame**: the two border styles
//! - **Caption**: text measurement and compositing
//! - **Fonts**: the font catalog and fallback chain

pub mod calculations;
pub mod caption;
pub(crate) mod exif_parser;
pub mod fonts;
pub mod frame;

pub use calculations::{CaptionAnchor, INSTAGRAM_CANVAS, Rect};
pub use caption::{TextSize, composite, measure};
pub use exif_parser::read_capture_date;
pub use fonts::{CaptionFont, FontCatalog, display_name};
pub use frame::{FramedCanvas, render, render_instagram, render_solid};
