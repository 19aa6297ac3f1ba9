//! Candidate image discovery and object key layout.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A local file selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Bare filename, e.g. `cat.jpg`
    pub file_name: String,

    /// Path on disk, e.g. `images/cat.jpg`
    pub path: PathBuf,
}

/// True if `file_name` ends with one of `extensions` (case-sensitive).
pub fn has_image_extension(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

/// List regular files directly inside `dir` whose name matches `extensions`.
///
/// Subdirectories are neither selected nor descended into. Names that are not
/// valid UTF-8 are skipped. With `sort` the result is ordered by filename,
/// otherwise it follows the directory listing.
pub fn discover_images(dir: &Path, extensions: &[String], sort: bool) -> Result<Vec<ImageFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read image directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;

        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!("Skipping non UTF-8 name {:?}", entry.file_name());
            continue;
        };
        if !has_image_extension(&file_name, extensions) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        images.push(ImageFile { file_name, path });
    }

    if sort {
        images.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    }

    Ok(images)
}

/// Join a key prefix and a filename with a single `/`.
///
/// An empty prefix yields the bare filename.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
