//! Framer configuration.
//!
//! Handles loading, validating, and merging `framer.toml`. Stock defaults
//! are serialized to a TOML table, the user file is merged on top, and the
//! result is deserialized and validated. Command-line flags are applied last
//! by the CLI.
//!
//! ## Config File Location
//!
//! `framer.toml` in the working directory is picked up automatically. Use
//! `--config PATH` to point somewhere else.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [frame]
//! style = "solid"           # "solid" or "instagram"
//! border_color = "#000000"
//! # thickness = 20          # Pixels, or "2.5%" of the shorter side
//! # padding = 150           # White mat around the border
//! # max_size = 1000         # Instagram only: longest photo side
//!
//! [caption]
//! text = ""                 # Explicit caption; wins over the capture date
//! use_capture_date = true   # " - JUL '24 -" from EXIF when text is empty
//! font = "CourierPrime-Bold"
//! # font_size = 50
//! font_color = "#000000"
//!
//! [fonts]
//! dirs = []                 # Extra directories searched for .ttf/.otf
//!
//! [output]
//! dir = "framed"
//! quality = 95              # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Thickness, padding, max size and font size default to the selected
//! style's preset when left out. Unknown keys are rejected to catch typos.

use crate::library::DEFAULT_QUALITY;
use crate::settings::{BorderStyle, CaptionSettings, Color, DEFAULT_FONT, FrameSpec, Thickness};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "framer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Framer configuration loaded from `framer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramerConfig {
    pub frame: FrameConfig,
    pub caption: CaptionConfig,
    pub fonts: FontsConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl FramerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if let Some(size) = self.caption.font_size
            && !(size.is_finite() && size > 0.0)
        {
            return Err(ConfigError::Validation(
                "caption.font_size must be positive".into(),
            ));
        }
        if self.frame.max_size == Some(0) {
            return Err(ConfigError::Validation(
                "frame.max_size must be non-zero".into(),
            ));
        }
        if let Some(Thickness::Percent(pct)) = self.frame.thickness
            && pct > 50.0
        {
            return Err(ConfigError::Validation(
                "frame.thickness percentage must be at most 50%".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The framing recipe: style presets with configured values on top.
    pub fn frame_spec(&self) -> FrameSpec {
        let mut spec = FrameSpec::for_style(self.frame.style);
        if let Some(thickness) = self.frame.thickness {
            spec.thickness = thickness;
        }
        if let Some(padding) = self.frame.padding {
            spec.padding = padding;
        }
        if let Some(max_size) = self.frame.max_size {
            spec.max_size = max_size;
        }
        spec.border_color = self.frame.border_color;
        spec.caption = CaptionSettings {
            text: self.caption.text.clone(),
            use_capture_date: self.caption.use_capture_date,
            font_name: self.caption.font.clone(),
            font_size: self.caption.font_size.unwrap_or(spec.caption.font_size),
            font_color: self.caption.font_color,
        };
        spec
    }
}

/// Border style and geometry. Unset geometry follows the style preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    pub style: BorderStyle,
    pub border_color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<Thickness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            style: BorderStyle::Solid,
            border_color: Color::BLACK,
            thickness: None,
            padding: None,
            max_size: None,
        }
    }
}

/// Caption text and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub text: String,
    pub use_capture_date: bool,
    pub font: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    pub font_color: Color,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            use_capture_date: true,
            font: DEFAULT_FONT.to_string(),
            font_size: None,
            font_color: Color::BLACK,
        }
    }
}

/// Where to look for fonts besides the platform directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub dirs: Vec<PathBuf>,
}

/// Output directory and encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("framed"),
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel framing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(FramerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FramerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FramerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
/// `dir` is used when present, and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<FramerConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&dir.join(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `framer.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Framer Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Frame
# ---------------------------------------------------------------------------
[frame]
# "solid": colored border, then a white mat. Canvas grows with the photo.
# "instagram": photo resized into a fixed 1080x1350 (4:5) white canvas.
style = "solid"

# Border color as #rrggbb or #rrggbbaa.
border_color = "#000000"

# Border thickness in pixels, or a percentage of the photo's shorter side.
# Defaults: solid 20, instagram 5.
# thickness = 20
# thickness = "2.5%"

# White padding between border and photo edge (solid: outside the border).
# Defaults: solid 150, instagram 0.
# padding = 150

# Instagram only: the photo is scaled so its longer side is this many pixels.
# Default: 1000.
# max_size = 1000

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
[caption]
# Explicit caption text. When non-empty it always wins.
text = ""

# With no explicit text, caption the photo with its capture month and year,
# e.g. " - JUL '24 -". Photos without EXIF dates get " - --- -".
use_capture_date = true

# Font identifier (file stem). Run `framer fonts` to list what is installed.
# Falls back to a bold system font when missing.
font = "CourierPrime-Bold"

# Font size in pixels. Defaults: solid 50, instagram 20.
# font_size = 50

font_color = "#000000"

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# Extra directories to search for .ttf / .otf files, before system fonts.
dirs = []

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory framed photos are written to.
dir = "framed"

# JPEG quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel framing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
