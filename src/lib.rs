//! # Framer
//!
//! Puts photos in frames. A photo gets a colored border, an optional white
//! mat and a caption (your text, or the month and year it was taken) and is
//! saved as a JPEG next to its siblings.
//!
//! # Architecture: One Pure Pipeline
//!
//! Every framed photo comes out of the same three steps, with no state kept
//! between calls:
//!
//! ```text
//! 1. Caption   settings + EXIF date  →  caption text
//! 2. Frame     photo + style         →  canvas (+ photo rectangle)
//! 3. Overlay   canvas + caption      →  final image
//! ```
//!
//! Identical inputs give pixel-identical output, which is what makes the
//! render cache safe: a photo whose bytes and framing recipe have not
//! changed never needs rendering again.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`settings`] | Border styles, presets, colors, thickness, caption settings |
//! | [`source`] | Loading photos: pixels plus EXIF capture date |
//! | [`caption`] | Caption text resolution (explicit text, capture date, placeholder) |
//! | [`imaging`] | Pure-Rust image work: frame rendering, text layout, fonts, EXIF parsing |
//! | [`compose`] | The compositor: caption → frame → overlay, inline or on a worker thread |
//! | [`library`] | Where results go: the `PhotoLibrary` trait and a JPEG directory sink |
//! | [`process`] | Batch framing of a file or directory tree with rayon |
//! | [`cache`] | Content-addressed render cache for repeated runs |
//! | [`config`] | `framer.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Styles, One Sum Type
//!
//! [`settings::FrameStyle`] carries each style's own fields (`max_size` only
//! exists for the instagram style), and [`imaging::render`] dispatches on it.
//! Switching style goes through [`settings::FrameSettings::reset_to_defaults`],
//! which swaps in the new style's preset geometry.
//!
//! ## Never Fail on Missing Pieces
//!
//! A photo without an EXIF date gets a placeholder caption. A font that
//! cannot be found is replaced by a bold system font, and with no fonts at
//! all captions are drawn with built-in block glyphs. A canvas too large to
//! allocate comes back empty. Only unreadable inputs and failed saves are
//! errors, and a batch run reports them per photo without stopping.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing and encoding use the `image` crate; text uses
//! `rusttype`. No system libraries are needed.

pub mod cache;
pub mod caption;
pub mod compose;
pub mod config;
pub mod imaging;
pub mod library;
pub mod output;
pub mod process;
pub mod settings;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
