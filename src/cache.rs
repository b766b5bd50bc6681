//! Render cache for repeated runs.
//!
//! Framing a photo means a full decode, a Lanczos resize for the instagram
//! style, caption rasterization and a JPEG encode. Re-running `framer frame`
//! over a folder that was already processed should not pay for any of that
//! when neither the photo nor the framing recipe changed.
//!
//! ## Cache keys
//!
//! The cache is **content-addressed**: lookups use `source_hash` plus
//! `settings_hash`, not the output file name. Renaming a source file does not
//! invalidate its cached frame; the old output is copied to the new name.
//!
//! - **`source_hash`**: SHA-256 of the source file bytes. The capture date
//!   lives inside those bytes, so date captions are covered too.
//! - **`settings_hash`**: SHA-256 of the JSON-serialized [`FrameSpec`] plus
//!   the JPEG quality. Any change to style, geometry, colors, caption or font
//!   produces a new hash.
//!
//! A hit requires a matching entry **and** the stored output file still
//! existing in the output directory.
//!
//! ## Storage
//!
//! The manifest is `<output_dir>/.framer-cache.json`. Pass `--no-cache` to
//! start from an empty manifest; outputs are then overwritten.

use crate::settings::FrameSpec;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".framer-cache.json";

/// Bump to invalidate every existing manifest when key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub settings_hash: String,
}

/// On-disk manifest mapping output file names to cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{settings_hash}"` → output name. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Missing, corrupt or outdated
    /// manifests all yield an empty one.
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = build_content_index(&manifest.entries);
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Output name previously rendered from this content, if it still exists.
    ///
    /// The returned name may differ from the one the caller is about to
    /// write; copying it over is the caller's job.
    pub fn find_cached(
        &self,
        source_hash: &str,
        settings_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let stored = self
            .content_index
            .get(&content_key(source_hash, settings_hash))?;
        output_dir.join(stored).exists().then(|| stored.clone())
    }

    /// Record that `output_name` was rendered from this content.
    ///
    /// An older entry for the same content under a different name is dropped,
    /// and so is any content that was previously stored under `output_name`.
    pub fn insert(&mut self, output_name: String, source_hash: String, settings_hash: String) {
        let key = content_key(&source_hash, &settings_hash);
        self.content_index.retain(|_, name| *name != output_name);

        if let Some(old_name) = self.content_index.get(&key)
            && *old_name != output_name
        {
            self.entries.remove(old_name.as_str());
        }

        self.content_index.insert(key, output_name.clone());
        self.entries.insert(
            output_name,
            CacheEntry {
                source_hash,
                settings_hash,
            },
        );
    }
}

fn content_key(source_hash: &str, settings_hash: &str) -> String {
    format!("{}:{}", source_hash, settings_hash)
}

fn build_content_index(entries: &HashMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(name, entry)| {
            (
                content_key(&entry.source_hash, &entry.settings_hash),
                name.clone(),
            )
        })
        .collect()
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint of everything that shapes an output besides the source bytes.
pub fn hash_settings(spec: &FrameSpec, quality: u8) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"frame\0");
    // FrameSpec serialization is infallible: plain numbers, strings and enums
    let json = serde_json::to_vec(spec).unwrap_or_default();
    hasher.update(&json);
    hasher.update([quality]);
    format!("{:x}", hasher.finalize())
}

/// Cache outcome counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: u32,
    pub copied: u32,
    pub rendered: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.cached += 1;
    }

    pub fn copy(&mut self) {
        self.copied += 1;
    }

    pub fn miss(&mut self) {
        self.rendered += 1;
    }

    pub fn total(&self) -> u32 {
        self.cached + self.copied + self.rendered
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.cached, self.copied) {
            (0, 0) => write!(f, "{} rendered", self.rendered),
            (_, 0) => write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.cached,
                self.rendered,
                self.total()
            ),
            _ => write!(
                f,
                "{} cached, {} copied, {} rendered ({} total)",
                self.cached,
                self.copied,
                self.rendered,
                self.total()
            ),
        }
    }
}

/// Path of the cache manifest for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BorderStyle, Thickness};
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // CacheManifest
    // =========================================================================

    #[test]
    fn empty_manifest_has_no_entries() {
        let m = CacheManifest::empty();
        assert_eq!(m.version, MANIFEST_VERSION);
        assert!(m.entries.is_empty());
        assert!(m.content_index.is_empty());
    }

    #[test]
    fn find_cached_hit() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("a_framed.jpg".into(), "src".into(), "set".into());
        fs::write(tmp.path().join("a_framed.jpg"), "data").unwrap();

        assert_eq!(
            m.find_cached("src", "set", tmp.path()),
            Some("a_framed.jpg".to_string())
        );
    }

    #[test]
    fn find_cached_miss_on_changed_hashes() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("out.jpg".into(), "src".into(), "set".into());
        fs::write(tmp.path().join("out.jpg"), "data").unwrap();

        assert_eq!(m.find_cached("other", "set", tmp.path()), None);
        assert_eq!(m.find_cached("src", "other", tmp.path()), None);
    }

    #[test]
    fn find_cached_miss_when_output_deleted() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("gone.jpg".into(), "h".into(), "s".into());
        assert_eq!(m.find_cached("h", "s", tmp.path()), None);
    }

    #[test]
    fn insert_drops_entry_for_renamed_output() {
        let mut m = CacheManifest::empty();
        m.insert("old_framed.jpg".into(), "src".into(), "set".into());
        m.insert("new_framed.jpg".into(), "src".into(), "set".into());

        assert!(!m.entries.contains_key("old_framed.jpg"));
        assert!(m.entries.contains_key("new_framed.jpg"));
    }

    #[test]
    fn overwriting_a_name_forgets_its_previous_content() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("x_framed.jpg"), "data").unwrap();
        let mut m = CacheManifest::empty();
        m.insert("x_framed.jpg".into(), "first".into(), "set".into());
        m.insert("x_framed.jpg".into(), "second".into(), "set".into());

        assert_eq!(m.find_cached("first", "set", tmp.path()), None);
        assert_eq!(
            m.find_cached("second", "set", tmp.path()),
            Some("x_framed.jpg".to_string())
        );
        assert_eq!(m.content_index.len(), 1);
    }

    #[test]
    fn save_and_load_roundtrip_rebuilds_index() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("x.jpg".into(), "s1".into(), "p1".into());
        m.insert("y.jpg".into(), "s2".into(), "p2".into());
        m.save(tmp.path()).unwrap();

        let loaded = CacheManifest::load(tmp.path());
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(
            loaded.entries["x.jpg"],
            CacheEntry {
                source_hash: "s1".into(),
                settings_hash: "p1".into()
            }
        );
        assert_eq!(loaded.content_index.get("s2:p2"), Some(&"y.jpg".to_string()));
    }

    #[test]
    fn load_missing_or_corrupt_returns_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());

        fs::write(manifest_path(tmp.path()), "not json").unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "entries": {{"a": {{"source_hash":"h","settings_hash":"p"}}}}}}"#,
            MANIFEST_VERSION + 1
        );
        fs::write(manifest_path(tmp.path()), json).unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    #[test]
    fn hash_bytes_tracks_content() {
        let h1 = hash_bytes(b"version 1");
        assert_eq!(h1, hash_bytes(b"version 1"));
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, hash_bytes(b"version 2"));
    }

    #[test]
    fn settings_hash_is_deterministic() {
        let spec = FrameSpec::for_style(BorderStyle::Solid);
        assert_eq!(hash_settings(&spec, 95), hash_settings(&spec.clone(), 95));
    }

    #[test]
    fn settings_hash_varies_with_every_input() {
        let base = FrameSpec::for_style(BorderStyle::Solid);
        let h = hash_settings(&base, 95);

        assert_ne!(h, hash_settings(&base, 80));
        assert_ne!(h, hash_settings(&FrameSpec::for_style(BorderStyle::Instagram), 95));

        let mut thicker = base.clone();
        thicker.thickness = Thickness::Percent(2.0);
        assert_ne!(h, hash_settings(&thicker, 95));

        let mut captioned = base.clone();
        captioned.caption.text = "Lisbon".into();
        assert_ne!(h, hash_settings(&captioned, 95));
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display() {
        let mut s = CacheStats::default();
        s.rendered = 3;
        assert_eq!(s.to_string(), "3 rendered");

        s.cached = 5;
        assert_eq!(s.to_string(), "5 cached, 3 rendered (8 total)");

        s.copied = 2;
        assert_eq!(s.to_string(), "5 cached, 2 copied, 3 rendered (10 total)");
    }
}
