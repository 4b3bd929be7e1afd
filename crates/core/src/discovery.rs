//! File discovery utilities
//!
//! Hooks receive their inputs from the pre-commit driver, so discovery is
//! limited to filtering that list and locating manifests above a file.

use std::path::{Path, PathBuf};

/// Find `file_name` in `start` or the nearest ancestor directory.
///
/// When `start` is a file the search begins in its parent. The walk stops at
/// the filesystem root; `None` means no ancestor contains the file.
pub fn find_upward(start: &Path, file_name: &str) -> Option<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(start)
    };

    let mut current: Option<&Path> = if start.is_file() {
        start.parent()
    } else {
        Some(start.as_path())
    };

    while let Some(dir) = current {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }

    None
}

/// Whether the path has one of the given extensions (without the dot)
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Keep only the paths with one of the given extensions, preserving order
pub fn filter_by_extension(paths: &[PathBuf], extensions: &[&str]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|p| has_extension(p, extensions))
        .cloned()
        .collect()
}
