//! Batch framing: every photo under an input path, in parallel.
//!
//! ## Inputs
//!
//! A single photo, or a directory walked recursively. Only files whose
//! extension has a compiled-in decoder are picked up (see
//! [`supported_input_extensions`](crate::source::supported_input_extensions)).
//! Inputs are sorted by path so runs are reproducible.
//!
//! ## Per photo
//!
//! ```text
//! read bytes ─┬─ sha256 ─── cache hit? ── yes ──▶ reuse (or copy) output
//!             │                 │
//!             │                 no
//!             ▼                 ▼
//!        capture date ──▶ decode ──▶ compose ──▶ save to library
//! ```
//!
//! A photo that fails to load or save is reported and skipped; the batch
//! carries on. Only problems with the input path itself abort the run.
//!
//! ## Output
//!
//! ```text
//! out/
//! ├── .framer-cache.json
//! ├── IMG_0001_framed.jpg
//! └── IMG_0002_framed.jpg
//! ```
//!
//! Output names come from the file stem. When photos in different
//! subdirectories share a stem, the first in sorted order keeps it and the
//! others get a numeric suffix: `x_framed.jpg`, `x-2_framed.jpg`.
//!
//! ## Parallel Processing
//!
//! Photos are framed in parallel with [rayon](https://docs.rs/rayon). Set
//! the pool size with `[processing] max_processes` in the config.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::caption;
use crate::compose::compose;
use crate::imaging::{FontCatalog, read_capture_date};
use crate::library::{PhotoLibrary, SaveError, output_name};
use crate::settings::FrameSpec;
use crate::source::{SourceError, SourceImage, is_supported};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Not a supported photo: {0}")]
    Unsupported(PathBuf),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Saving {name} failed: {source}")]
    Save { name: String, source: SaveError },
    #[error("Reusing cached {name} failed: {source}")]
    CacheCopy {
        name: String,
        source: std::io::Error,
    },
}

/// How an output came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Output already up to date.
    Cached,
    /// Same content was rendered under another name; copied over.
    Copied,
    /// Composed and encoded in this run.
    Rendered,
}

/// Progress events, sent as photos finish (not necessarily in order).
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        total: usize,
    },
    Framed {
        /// 1-based position in the sorted input list.
        index: usize,
        source_path: String,
        output_name: String,
        caption: String,
        status: RenderStatus,
    },
    Failed {
        index: usize,
        source_path: String,
        error: String,
    },
}

/// One successfully framed photo.
#[derive(Debug, Clone, PartialEq)]
pub struct FramedPhoto {
    pub source: PathBuf,
    pub output: PathBuf,
    pub caption: String,
    pub status: RenderStatus,
}

/// One photo that could not be framed.
#[derive(Debug)]
pub struct Failure {
    pub source: PathBuf,
    pub error: ProcessError,
}

#[derive(Debug, Default)]
pub struct ProcessResult {
    /// In input order.
    pub outputs: Vec<FramedPhoto>,
    pub failures: Vec<Failure>,
    pub cache_stats: CacheStats,
}

/// Photos to frame under `input`, sorted by path.
///
/// A file is accepted as-is if its extension is supported; a directory is
/// walked recursively. Hidden entries (dot-prefixed) are skipped.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if !input.exists() {
        return Err(ProcessError::InputNotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return if is_supported(input) {
            Ok(vec![input.to_path_buf()])
        } else {
            Err(ProcessError::Unsupported(input.to_path_buf()))
        };
    }

    let mut photos: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();
    photos.sort();
    Ok(photos)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Frame every photo in `inputs` and save it to `library`.
///
/// The render cache is used when `use_cache` is set and the library has a
/// filesystem location; the manifest is rewritten at the end either way so
/// the next run can reuse this one's work.
pub fn process<L: PhotoLibrary>(
    inputs: &[PathBuf],
    spec: &FrameSpec,
    fonts: &FontCatalog,
    library: &L,
    quality: u8,
    use_cache: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let cache_dir = library.location().map(Path::to_path_buf);
    let manifest = match (&cache_dir, use_cache) {
        (Some(dir), true) => CacheManifest::load(dir),
        _ => CacheManifest::empty(),
    };
    let ctx = FrameContext {
        spec,
        fonts,
        library,
        settings_hash: cache::hash_settings(spec, quality),
        cache_dir: cache_dir.as_deref(),
        manifest: Mutex::new(manifest),
    };

    if let Some(tx) = &progress {
        tx.send(ProcessEvent::Started {
            total: inputs.len(),
        })
        .ok();
    }

    let names = output_names(inputs, spec);
    let results: Vec<(PathBuf, Result<FramedPhoto, ProcessError>)> = inputs
        .par_iter()
        .zip(names.par_iter())
        .enumerate()
        .map(|(i, (path, name))| {
            let result = ctx.frame_one(path, name);
            if let Some(tx) = &progress {
                tx.send(event_for(i + 1, path, &result)).ok();
            }
            (path.clone(), result)
        })
        .collect();

    let mut out = ProcessResult::default();
    for (source, result) in results {
        match result {
            Ok(framed) => {
                match framed.status {
                    RenderStatus::Cached => out.cache_stats.hit(),
                    RenderStatus::Copied => out.cache_stats.copy(),
                    RenderStatus::Rendered => out.cache_stats.miss(),
                }
                out.outputs.push(framed);
            }
            Err(error) => {
                warn!(source = %source.display(), %error, "photo skipped");
                out.failures.push(Failure { source, error });
            }
        }
    }

    if let Some(dir) = &cache_dir {
        let manifest = ctx
            .manifest
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        manifest.save(dir)?;
    }

    Ok(out)
}

/// Output file name for each input, unique within the batch.
///
/// Repeated stems are numbered from 2 in input order, skipping numbers that
/// another input's own stem already uses.
fn output_names(inputs: &[PathBuf], spec: &FrameSpec) -> Vec<String> {
    let stems: Vec<String> = inputs
        .iter()
        .map(|path| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect();
    let own: HashSet<&str> = stems.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::new();

    let mut names = Vec::with_capacity(stems.len());
    for stem in &stems {
        let mut chosen = stem.clone();
        let mut n = 2;
        while used.contains(&chosen) {
            chosen = format!("{}-{}", stem, n);
            n += 1;
            if own.contains(chosen.as_str()) {
                chosen = stem.clone();
            }
        }
        if chosen != *stem {
            debug!(stem = %stem, renamed = %chosen, "duplicate stem in batch");
        }
        names.push(output_name(&chosen, spec.style));
        used.insert(chosen);
    }
    names
}

fn event_for(index: usize, path: &Path, result: &Result<FramedPhoto, ProcessError>) -> ProcessEvent {
    let source_path = path.display().to_string();
    match result {
        Ok(framed) => ProcessEvent::Framed {
            index,
            source_path,
            output_name: framed
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            caption: framed.caption.clone(),
            status: framed.status,
        },
        Err(e) => ProcessEvent::Failed {
            index,
            source_path,
            error: e.to_string(),
        },
    }
}

/// Everything shared by the per-photo workers.
struct FrameContext<'a, L> {
    spec: &'a FrameSpec,
    fonts: &'a FontCatalog,
    library: &'a L,
    settings_hash: String,
    cache_dir: Option<&'a Path>,
    manifest: Mutex<CacheManifest>,
}

impl<L: PhotoLibrary> FrameContext<'_, L> {
    fn frame_one(&self, path: &Path, name: &str) -> Result<FramedPhoto, ProcessError> {
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source_hash = cache::hash_bytes(&bytes);

        if let Some(dir) = self.cache_dir
            && let Some(status) = self.reuse_cached(dir, &source_hash, name)?
        {
            debug!(source = %path.display(), ?status, "cache hit");
            return Ok(FramedPhoto {
                source: path.to_path_buf(),
                output: dir.join(name),
                caption: caption::resolve_with_date(&self.spec.caption, read_capture_date(&bytes)),
                status,
            });
        }

        let source = SourceImage::from_bytes(&bytes).map_err(|reason| SourceError::Decode {
            path: path.to_path_buf(),
            reason,
        })?;
        let settings = self.spec.settings_for(source.dimensions());
        let composed = compose(&source, &settings, self.fonts);
        let output = self
            .library
            .save(&composed.image, name)
            .map_err(|source| ProcessError::Save {
                name: name.to_string(),
                source,
            })?;

        if self.cache_dir.is_some() {
            self.lock_manifest()
                .insert(name.to_string(), source_hash, self.settings_hash.clone());
        }

        Ok(FramedPhoto {
            source: path.to_path_buf(),
            output,
            caption: composed.caption,
            status: RenderStatus::Rendered,
        })
    }

    /// Reuse a previous output for this content, copying it if it was
    /// written under another name.
    fn reuse_cached(
        &self,
        dir: &Path,
        source_hash: &str,
        name: &str,
    ) -> Result<Option<RenderStatus>, ProcessError> {
        let stored = self
            .lock_manifest()
            .find_cached(source_hash, &self.settings_hash, dir);
        let Some(stored) = stored else {
            return Ok(None);
        };

        let status = if stored == name {
            RenderStatus::Cached
        } else {
            std::fs::copy(dir.join(&stored), dir.join(name)).map_err(|source| {
                ProcessError::CacheCopy {
                    name: name.to_string(),
                    source,
                }
            })?;
            RenderStatus::Copied
        };
        self.lock_manifest().insert(
            name.to_string(),
            source_hash.to_string(),
            self.settings_hash.clone(),
        );
        Ok(Some(status))
    }

    fn lock_manifest(&self) -> std::sync::MutexGuard<'_, CacheManifest> {
        self.manifest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
