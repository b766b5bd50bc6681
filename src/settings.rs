//! Frame settings: the immutable value handed to the compositor.
//!
//! The CLI (or any other front end) owns mutation. For every composition
//! request it builds a fresh [`FrameSettings`] and passes it by reference;
//! nothing in the pipeline writes back into it.
//!
//! ## Types
//!
//! - [`Color`]: RGBA color, parsed from `#rrggbb` or `#rrggbbaa`.
//! - [`Thickness`]: border thickness in pixels or as a percentage of the
//!   source image's shorter side. Resolved per photo.
//! - [`BorderStyle`]: the style selector (`solid` | `instagram`).
//! - [`FrameStyle`]: the resolved style with its style-specific fields.
//! - [`StylePreset`]: per-style defaults applied when switching styles.
//! - [`FrameSpec`]: a run-wide recipe; [`FrameSpec::settings_for`] turns it
//!   into concrete [`FrameSettings`] for one photo.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid color '{0}': expected #rrggbb or #rrggbbaa")]
    Color(String),
    #[error("invalid thickness '{0}': expected pixels (20) or a percentage (2.5%)")]
    Thickness(String),
}

// =============================================================================
// Color
// =============================================================================

/// An RGBA color.
///
/// Serialized as a hex string so config files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SettingsError::Color(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| SettingsError::Color(s.to_string()))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

impl TryFrom<String> for Color {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

// =============================================================================
// Thickness
// =============================================================================

/// Border thickness, either absolute or relative to the photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThickness", into = "String")]
pub enum Thickness {
    Pixels(u32),
    /// Percentage of the source image's shorter side.
    Percent(f32),
}

impl Thickness {
    /// Resolve to pixels for a source of the given dimensions.
    ///
    /// Percentages truncate toward zero: 2.5% of 1000 px is 25 px, 2.5% of
    /// 999 px is 24 px.
    pub fn resolve(self, (width, height): (u32, u32)) -> u32 {
        match self {
            Thickness::Pixels(px) => px,
            Thickness::Percent(pct) => {
                let shorter = width.min(height) as f64;
                (shorter * pct as f64 / 100.0) as u32
            }
        }
    }
}

impl FromStr for Thickness {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || SettingsError::Thickness(s.to_string());
        match trimmed.strip_suffix('%') {
            Some(pct) => {
                let value: f32 = pct.trim().parse().map_err(|_| invalid())?;
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid());
                }
                Ok(Thickness::Percent(value))
            }
            None => trimmed
                .strip_suffix("px")
                .unwrap_or(trimmed)
                .trim()
                .parse()
                .map(Thickness::Pixels)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thickness::Pixels(px) => write!(f, "{}", px),
            Thickness::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

impl From<Thickness> for String {
    fn from(t: Thickness) -> Self {
        t.to_string()
    }
}

/// Config files may write `thickness = 20` or `thickness = "2%"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawThickness {
    Pixels(u32),
    Text(String),
}

impl TryFrom<RawThickness> for Thickness {
    type Error = SettingsError;

    fn try_from(raw: RawThickness) -> Result<Self, Self::Error> {
        match raw {
            RawThickness::Pixels(px) => Ok(Thickness::Pixels(px)),
            RawThickness::Text(s) => s.parse(),
        }
    }
}

// =============================================================================
// Styles and presets
// =============================================================================

/// Which frame algorithm to use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    /// Rectangular mat: colored border, then white padding.
    #[default]
    Solid,
    /// Fixed 1080x1350 (4:5) white canvas with the photo centered.
    Instagram,
}

impl BorderStyle {
    /// Suffix appended to output file stems.
    pub fn output_suffix(self) -> &'static str {
        match self {
            BorderStyle::Solid => "framed",
            BorderStyle::Instagram => "instagram",
        }
    }

    /// Defaults applied when switching to this style.
    pub fn preset(self) -> StylePreset {
        match self {
            BorderStyle::Solid => StylePreset {
                thickness: 20,
                padding: 150,
                font_size: 50.0,
                max_size: 900,
            },
            BorderStyle::Instagram => StylePreset {
                thickness: 5,
                padding: 0,
                font_size: 20.0,
                max_size: 1000,
            },
        }
    }
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BorderStyle::Solid => "solid",
            BorderStyle::Instagram => "instagram",
        })
    }
}

/// Style-dependent defaults.
///
/// `max_size` only affects the instagram style; the solid preset carries one
/// anyway so switching back and forth is lossless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePreset {
    pub thickness: u32,
    pub padding: u32,
    pub font_size: f32,
    pub max_size: u32,
}

/// A border style together with its resolved geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum FrameStyle {
    Solid {
        thickness: u32,
        padding: u32,
    },
    Instagram {
        thickness: u32,
        padding: u32,
        max_size: u32,
    },
}

impl FrameStyle {
    pub fn border_style(&self) -> BorderStyle {
        match self {
            FrameStyle::Solid { .. } => BorderStyle::Solid,
            FrameStyle::Instagram { .. } => BorderStyle::Instagram,
        }
    }

    pub fn thickness(&self) -> u32 {
        match *self {
            FrameStyle::Solid { thickness, .. } | FrameStyle::Instagram { thickness, .. } => {
                thickness
            }
        }
    }

    pub fn padding(&self) -> u32 {
        match *self {
            FrameStyle::Solid { padding, .. } | FrameStyle::Instagram { padding, .. } => padding,
        }
    }

    fn from_preset(style: BorderStyle, preset: StylePreset) -> Self {
        match style {
            BorderStyle::Solid => FrameStyle::Solid {
                thickness: preset.thickness,
                padding: preset.padding,
            },
            BorderStyle::Instagram => FrameStyle::Instagram {
                thickness: preset.thickness,
                padding: preset.padding,
                max_size: preset.max_size,
            },
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Caption text and typography.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionSettings {
    /// Explicit caption. Wins over the capture date when non-empty.
    pub text: String,
    /// Derive the caption from the photo's capture date when `text` is empty.
    pub use_capture_date: bool,
    /// Font identifier, e.g. `CourierPrime-Bold`.
    pub font_name: String,
    pub font_size: f32,
    pub font_color: Color,
}

pub const DEFAULT_FONT: &str = "CourierPrime-Bold";

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            use_capture_date: true,
            font_name: DEFAULT_FONT.to_string(),
            font_size: BorderStyle::Solid.preset().font_size,
            font_color: Color::BLACK,
        }
    }
}

/// Everything the compositor needs to frame one photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSettings {
    pub style: FrameStyle,
    pub border_color: Color,
    pub caption: CaptionSettings,
}

impl FrameSettings {
    /// Settings for `style` with that style's preset geometry and font size.
    pub fn for_style(style: BorderStyle) -> Self {
        Self::default().reset_to_defaults(style)
    }

    /// Switch to `style`, resetting thickness, padding, font size and max
    /// size to the style's preset. Colors and caption text are kept.
    pub fn reset_to_defaults(self, style: BorderStyle) -> Self {
        let preset = style.preset();
        Self {
            style: FrameStyle::from_preset(style, preset),
            caption: CaptionSettings {
                font_size: preset.font_size,
                ..self.caption
            },
            ..self
        }
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        let preset = BorderStyle::Solid.preset();
        Self {
            style: FrameStyle::from_preset(BorderStyle::Solid, preset),
            border_color: Color::BLACK,
            caption: CaptionSettings::default(),
        }
    }
}

/// A run-wide framing recipe.
///
/// Thickness may be relative to each photo, so concrete [`FrameSettings`]
/// are only produced once the photo's dimensions are known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSpec {
    pub style: BorderStyle,
    pub thickness: Thickness,
    pub padding: u32,
    pub max_size: u32,
    pub border_color: Color,
    pub caption: CaptionSettings,
}

impl FrameSpec {
    /// Recipe using every preset value of `style`.
    pub fn for_style(style: BorderStyle) -> Self {
        let preset = style.preset();
        Self {
            style,
            thickness: Thickness::Pixels(preset.thickness),
            padding: preset.padding,
            max_size: preset.max_size,
            border_color: Color::BLACK,
            caption: CaptionSettings {
                font_size: preset.font_size,
                ..CaptionSettings::default()
            },
        }
    }

    /// Concrete settings for a photo of `dimensions`.
    pub fn settings_for(&self, dimensions: (u32, u32)) -> FrameSettings {
        let thickness = self.thickness.resolve(dimensions);
        let style = match self.style {
            BorderStyle::Solid => FrameStyle::Solid {
                thickness,
                padding: self.padding,
            },
            BorderStyle::Instagram => FrameStyle::Instagram {
                thickness,
                padding: self.padding,
                max_size: self.max_size,
            },
        };
        FrameSettings {
            style,
            border_color: self.border_color,
            caption: self.caption.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_rgb_and_rgba() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(
            "00000080".parse::<Color>().unwrap(),
            Color {
                r: 0,
                g: 0,
                b: 0,
                a: 128
            }
        );
    }

    #[test]
    fn color_rejects_bad_input() {
        assert!("#fff".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("#+f+f+f".parse::<Color>().is_err());
        assert!("#-1ff00".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_is_lowercase_hex() {
        assert_eq!(Color::rgb(255, 0, 170).to_string(), "#ff00aa");
        let translucent = Color { a: 16, ..Color::WHITE };
        assert_eq!(translucent.to_string(), "#ffffff10");
    }

    #[test]
    fn thickness_parses_pixels_and_percent() {
        assert_eq!("20".parse::<Thickness>().unwrap(), Thickness::Pixels(20));
        assert_eq!("20px".parse::<Thickness>().unwrap(), Thickness::Pixels(20));
        assert_eq!("2.5%".parse::<Thickness>().unwrap(), Thickness::Percent(2.5));
        assert!("-3%".parse::<Thickness>().is_err());
        assert!("wide".parse::<Thickness>().is_err());
    }

    #[test]
    fn thickness_percent_uses_shorter_side() {
        assert_eq!(Thickness::Percent(2.5).resolve((4000, 1000)), 25);
        assert_eq!(Thickness::Percent(2.5).resolve((999, 4000)), 24);
        assert_eq!(Thickness::Pixels(7).resolve((10, 10)), 7);
    }

    #[test]
    fn solid_preset_values() {
        let s = FrameSettings::for_style(BorderStyle::Solid);
        assert_eq!(
            s.style,
            FrameStyle::Solid {
                thickness: 20,
                padding: 150
            }
        );
        assert_eq!(s.caption.font_size, 50.0);
        assert_eq!(BorderStyle::Solid.preset().max_size, 900);
    }

    #[test]
    fn instagram_preset_values() {
        let s = FrameSettings::for_style(BorderStyle::Instagram);
        assert_eq!(
            s.style,
            FrameStyle::Instagram {
                thickness: 5,
                padding: 0,
                max_size: 1000
            }
        );
        assert_eq!(s.caption.font_size, 20.0);
    }

    #[test]
    fn reset_keeps_colors_and_text() {
        let mut s = FrameSettings::for_style(BorderStyle::Solid);
        s.border_color = Color::rgb(10, 20, 30);
        s.caption.text = "Hello".into();
        s.caption.font_size = 99.0;

        let switched = s.reset_to_defaults(BorderStyle::Instagram);
        assert_eq!(switched.border_color, Color::rgb(10, 20, 30));
        assert_eq!(switched.caption.text, "Hello");
        assert_eq!(switched.caption.font_size, 20.0);
        assert_eq!(switched.style.thickness(), 5);

        let back = switched.reset_to_defaults(BorderStyle::Solid);
        assert_eq!(back.style.thickness(), 20);
        assert_eq!(back.style.padding(), 150);
        assert_eq!(back.caption.font_size, 50.0);
    }

    #[test]
    fn spec_resolves_percent_thickness_per_photo() {
        let spec = FrameSpec {
            thickness: Thickness::Percent(10.0),
            ..FrameSpec::for_style(BorderStyle::Solid)
        };
        assert_eq!(spec.settings_for((300, 200)).style.thickness(), 20);
        assert_eq!(spec.settings_for((50, 80)).style.thickness(), 5);
    }

    #[test]
    fn spec_for_instagram_carries_max_size() {
        let spec = FrameSpec {
            max_size: 640,
            ..FrameSpec::for_style(BorderStyle::Instagram)
        };
        assert_eq!(
            spec.settings_for((100, 100)).style,
            FrameStyle::Instagram {
                thickness: 5,
                padding: 0,
                max_size: 640
            }
        );
    }

    #[test]
    fn output_suffixes() {
        assert_eq!(BorderStyle::Solid.output_suffix(), "framed");
        assert_eq!(BorderStyle::Instagram.output_suffix(), "instagram");
    }
}
