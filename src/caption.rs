//! Caption text resolution.
//!
//! Resolution order (first match wins):
//!
//! ```text
//! 1. Explicit caption text        "Lisbon"         → "Lisbon"
//! 2. Capture date, if enabled     2024-07-15       → " - JUL '24 -"
//!    ... but no readable date                      → " - --- -"
//! 3. Otherwise                                     → ""
//! ```
//!
//! A missing date is the normal fallback, not an error.

use crate::settings::CaptionSettings;
use crate::source::SourceImage;
use chrono::NaiveDateTime;

/// Caption used when the capture date is requested but unavailable.
pub const UNKNOWN_DATE_CAPTION: &str = " - --- -";

/// Decide the caption for `source` under `settings`.
pub fn resolve(settings: &CaptionSettings, source: &SourceImage) -> String {
    resolve_with_date(settings, source.captured_at())
}

/// [`resolve`] with the capture date supplied directly.
pub fn resolve_with_date(settings: &CaptionSettings, captured_at: Option<NaiveDateTime>) -> String {
    if !settings.text.is_empty() {
        settings.text.clone()
    } else if settings.use_capture_date {
        caption_from_date(captured_at)
    } else {
        String::new()
    }
}

/// `" - JUL '24 -"` for a date, [`UNKNOWN_DATE_CAPTION`] without one.
pub fn caption_from_date(date: Option<NaiveDateTime>) -> String {
    match date {
        Some(dt) => format!(
            " - {} '{} -",
            dt.format("%b").to_string().to_uppercase(),
            dt.format("%y")
        ),
        None => UNKNOWN_DATE_CAPTION.to_string(),
    }
}
