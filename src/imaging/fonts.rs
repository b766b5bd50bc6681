//! Font catalog: discovery, display names, and caption-font resolution.
//!
//! Fonts are identified by file stem (`CourierPrime-Bold.ttf` →
//! `CourierPrime-Bold`). The catalog is built by walking the configured font
//! directories first, then the platform's standard locations; the first file
//! seen for an identifier wins, so configured directories override system
//! fonts.
//!
//! Resolution never fails. A missing or unreadable font falls back to a
//! bold sans from [`FALLBACK_BOLD`], then to any readable font, and finally
//! to [`CaptionFont::Blocks`], a built-in block-glyph renderer that needs
//! no font file at all.

use rusttype::Font;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use walkdir::WalkDir;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Bold system fonts tried, in order, when the requested font is missing.
pub const FALLBACK_BOLD: &[&str] = &[
    "DejaVuSans-Bold",
    "LiberationSans-Bold",
    "Arial Bold",
    "Arial-BoldMT",
    "Helvetica-Bold",
    "NotoSans-Bold",
    "Roboto-Bold",
    "arialbd",
];

/// A font ready for caption drawing.
#[derive(Clone)]
pub enum CaptionFont {
    Outline(Font<'static>),
    /// Built-in rectangle glyphs, used when no font file is available.
    Blocks,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionFont::Outline(_) => f.write_str("CaptionFont::Outline"),
            CaptionFont::Blocks => f.write_str("CaptionFont::Blocks"),
        }
    }
}

/// Installed fonts, keyed by identifier.
#[derive(Debug)]
pub struct FontCatalog {
    entries: BTreeMap<String, PathBuf>,
    loaded: Mutex<HashMap<String, CaptionFont>>,
}

impl FontCatalog {
    /// Catalog over `extra_dirs` followed by the platform font directories.
    pub fn discover(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = extra_dirs.to_vec();
        dirs.extend(system_font_dirs());
        Self::from_dirs(&dirs)
    }

    /// Catalog over exactly these directories. Missing directories are skipped.
    pub fn from_dirs(dirs: &[PathBuf]) -> Self {
        let mut entries = BTreeMap::new();
        for dir in dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if entry.file_type().is_file()
                    && is_font_file(path)
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                {
                    entries
                        .entry(stem.to_string())
                        .or_insert_with(|| path.to_path_buf());
                }
            }
        }
        debug!(count = entries.len(), "font catalog built");
        Self {
            entries,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Sorted identifiers of every installed font.
    pub fn available_fonts(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Parse the font file for `id`, if installed and readable.
    pub fn resolve(&self, id: &str) -> Option<Font<'static>> {
        let path = self.entries.get(id)?;
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!(font = id, path = %path.display(), error = %e, "cannot read font file");
                return None;
            }
        };
        let font = Font::try_from_vec_and_index(bytes, 0);
        if font.is_none() {
            warn!(font = id, path = %path.display(), "cannot parse font file");
        }
        font
    }

    /// First bold sans that resolves, else any font that resolves.
    pub fn fallback_bold(&self) -> Option<(String, Font<'static>)> {
        let preferred = FALLBACK_BOLD.iter().map(|s| s.to_string());
        let bold = self
            .entries
            .keys()
            .filter(|id| id.to_ascii_lowercase().contains("bold"))
            .cloned();
        let any = self.entries.keys().cloned();
        preferred
            .chain(bold)
            .chain(any)
            .find_map(|id| self.resolve(&id).map(|font| (id, font)))
    }

    /// Font for captions set in `id`, substituting a fallback when needed.
    ///
    /// Results are memoized per identifier, so batch runs read each font
    /// file once.
    pub fn caption_font(&self, id: &str) -> CaptionFont {
        if let Some(font) = self.lock_loaded().get(id) {
            return font.clone();
        }

        let font = match self.resolve(id) {
            Some(font) => CaptionFont::Outline(font),
            None => match self.fallback_bold() {
                Some((fallback, font)) => {
                    warn!(font = id, fallback = %fallback, "font not found, using fallback");
                    CaptionFont::Outline(font)
                }
                None => {
                    warn!(font = id, "no usable font installed, drawing block glyphs");
                    CaptionFont::Blocks
                }
            },
        };
        self.lock_loaded().insert(id.to_string(), font.clone());
        font
    }

    fn lock_loaded(&self) -> std::sync::MutexGuard<'_, HashMap<String, CaptionFont>> {
        // A poisoned memo table only loses cached fonts, which reload on demand.
        self.loaded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Human-readable name: `"Family-Weight"` → `"Family Weight"`.
///
/// Splits on hyphens and joins the first two segments; identifiers without
/// a hyphen pass through unchanged.
pub fn display_name(id: &str) -> String {
    let parts: Vec<&str> = id.split('-').filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 {
        format!("{} {}", parts[0], parts[1])
    } else {
        id.to_string()
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
}

/// Standard font locations for the current platform.
fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = &home {
            dirs.push(home.join("Library/Fonts"));
        }
    } else if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
    } else {
        if let Some(home) = &home {
            dirs.push(home.join(".local/share/fonts"));
            dirs.push(home.join(".fonts"));
        }
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
    }
    dirs
}
