//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each photo leads with its positional index and file name; the output
//! name, caption and cache status follow as indented context lines. Paths
//! are shown as given on the command line.
//!
//! # Output Format
//!
//! ## Frame
//!
//! ```text
//! Framing 3 photos
//! 001 IMG_0001.jpg → IMG_0001_framed.jpg
//!     Source: photos/IMG_0001.jpg
//!     Caption: " - JUL '24 -"
//!     rendered
//! 002 IMG_0002.jpg
//!     Source: photos/IMG_0002.jpg
//!     Error: Failed to decode photos/IMG_0002.jpg: ...
//!
//! Framed 2 photos → framed/
//! Cache: 1 cached, 1 rendered (2 total)
//! Failed 1 photo
//!     photos/IMG_0002.jpg
//! ```
//!
//! ## Fonts
//!
//! ```text
//! CourierPrime-Bold  CourierPrime Bold
//! DejaVuSans-Bold    DejaVuSans Bold
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::display_name;
use crate::process::{ProcessEvent, ProcessResult, RenderStatus};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { total } => {
            vec![format!("Framing {}", plural(*total, "photo"))]
        }
        ProcessEvent::Framed {
            index,
            source_path,
            output_name,
            caption,
            status,
        } => {
            let mut lines = vec![
                format!(
                    "{} {} → {}",
                    format_index(*index),
                    file_name(source_path),
                    output_name
                ),
                format!("{}Source: {}", indent(1), source_path),
            ];
            if !caption.is_empty() {
                lines.push(format!("{}Caption: {:?}", indent(1), caption));
            }
            let status = match status {
                RenderStatus::Cached => "cached",
                RenderStatus::Copied => "copied",
                RenderStatus::Rendered => "rendered",
            };
            lines.push(format!("{}{}", indent(1), status));
            lines
        }
        ProcessEvent::Failed {
            index,
            source_path,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source_path)),
            format!("{}Source: {}", indent(1), source_path),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(result: &ProcessResult, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Framed {} → {}/",
            plural(result.outputs.len(), "photo"),
            output_dir.display()
        ),
        format!("Cache: {}", result.cache_stats),
    ];
    if !result.failures.is_empty() {
        lines.push(format!("Failed {}", plural(result.failures.len(), "photo")));
        for failure in &result.failures {
            lines.push(format!("{}{}", indent(1), failure.source.display()));
        }
    }
    lines
}

pub fn print_summary(result: &ProcessResult, output_dir: &Path) {
    for line in format_summary(result, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Fonts
// ============================================================================

/// Format font identifiers with their display names, aligned in two columns.
pub fn format_font_list(ids: &[String]) -> Vec<String> {
    if ids.is_empty() {
        return vec!["No fonts found".to_string()];
    }
    let width = ids.iter().map(|id| id.chars().count()).max().unwrap_or(0);
    ids.iter()
        .map(|id| format!("{:<width$}  {}", id, display_name(id), width = width))
        .collect()
}

pub fn print_font_list(ids: &[String]) {
    for line in format_font_list(ids) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::process::{Failure, FramedPhoto, ProcessError};
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "photo"), "1 photo");
        assert_eq!(plural(0, "photo"), "0 photos");
        assert_eq!(plural(3, "photo"), "3 photos");
    }

    // =========================================================================
    // Process event formatting
    // =========================================================================

    #[test]
    fn format_started() {
        let lines = format_process_event(&ProcessEvent::Started { total: 5 });
        assert_eq!(lines, vec!["Framing 5 photos"]);
    }

    #[test]
    fn format_framed_with_caption() {
        let event = ProcessEvent::Framed {
            index: 1,
            source_path: "photos/IMG_0001.jpg".to_string(),
            output_name: "IMG_0001_framed.jpg".to_string(),
            caption: " - JUL '24 -".to_string(),
            status: RenderStatus::Rendered,
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "001 IMG_0001.jpg → IMG_0001_framed.jpg",
                "    Source: photos/IMG_0001.jpg",
                "    Caption: \" - JUL '24 -\"",
                "    rendered",
            ]
        );
    }

    #[test]
    fn format_framed_without_caption() {
        let event = ProcessEvent::Framed {
            index: 12,
            source_path: "a.png".to_string(),
            output_name: "a_instagram.jpg".to_string(),
            caption: String::new(),
            status: RenderStatus::Cached,
        };
        let lines = format_process_event(&event);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "012 a.png → a_instagram.jpg");
        assert_eq!(lines[2], "    cached");
    }

    #[test]
    fn format_failed() {
        let event = ProcessEvent::Failed {
            index: 2,
            source_path: "photos/bad.jpg".to_string(),
            error: "Failed to decode".to_string(),
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "002 bad.jpg",
                "    Source: photos/bad.jpg",
                "    Error: Failed to decode",
            ]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn summary_lists_failures() {
        let result = ProcessResult {
            outputs: vec![FramedPhoto {
                source: PathBuf::from("in/a.jpg"),
                output: PathBuf::from("out/a_framed.jpg"),
                caption: String::new(),
                status: RenderStatus::Rendered,
            }],
            failures: vec![Failure {
                source: PathBuf::from("in/b.jpg"),
                error: ProcessError::InputNotFound(PathBuf::from("in/b.jpg")),
            }],
            cache_stats: CacheStats {
                cached: 0,
                copied: 0,
                rendered: 1,
            },
        };
        assert_eq!(
            format_summary(&result, Path::new("out")),
            vec![
                "",
                "Framed 1 photo → out/",
                "Cache: 1 rendered",
                "Failed 1 photo",
                "    in/b.jpg",
            ]
        );
    }

    #[test]
    fn summary_without_failures() {
        let result = ProcessResult::default();
        let lines = format_summary(&result, Path::new("framed"));
        assert_eq!(lines[1], "Framed 0 photos → framed/");
        assert_eq!(lines.len(), 3);
    }

    // =========================================================================
    // Fonts
    // =========================================================================

    #[test]
    fn font_list_aligns_display_names() {
        let ids = vec!["CourierPrime-Bold".to_string(), "Arial".to_string()];
        assert_eq!(
            format_font_list(&ids),
            vec!["CourierPrime-Bold  CourierPrime Bold", "Arial              Arial"]
        );
    }

    #[test]
    fn font_list_empty() {
        assert_eq!(format_font_list(&[]), vec!["No fonts found"]);
    }
}
