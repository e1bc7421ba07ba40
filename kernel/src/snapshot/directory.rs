//! Builds snapshot documents from a source tree on disk.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::types::SourceDocument;
use crate::infrastructure::config::WatchSettings;

/// Errors that can occur while scanning a source tree.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The root path could not be resolved.
    #[error("Invalid source root '{path}': {source}")]
    InvalidRoot {
        /// Path that was invalid.
        path: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },
    /// The root exists but is not a directory.
    #[error("Source root is not a directory: {0}")]
    NotADirectory(PathBuf),
    /// Walking the directory tree failed.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    /// A matching file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Source error.
        #[source]
        source: std::io::Error,
    },
}

/// Scans `root` and returns one document per matching source file.
///
/// Hidden entries and directories listed in `settings.ignored_dirs` are
/// skipped. Files that are not valid UTF-8 are skipped with a warning. The
/// project of a document is its first path component, or the root directory
/// name for top-level files.
///
/// # Errors
///
/// Returns an error if the root is invalid or a file cannot be read.
pub fn scan_directory(root: &Path, settings: &WatchSettings) -> Result<Vec<SourceDocument>, ScanError> {
    let root = dunce::canonicalize(root).map_err(|e| ScanError::InvalidRoot {
        path: root.display().to_string(),
        source: e,
    })?;
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }

    let root_name = root
        .file_name()
        .map_or_else(|| "root".to_string(), |n| n.to_string_lossy().into_owned());

    let mut documents = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry, settings));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_watched_extension(entry.path(), settings) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };

        let bytes = std::fs::read(entry.path()).map_err(|e| ScanError::Read {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        let Ok(content) = String::from_utf8(bytes) else {
            warn!(path = %entry.path().display(), "Skipping non UTF-8 source file");
            continue;
        };

        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let project = if relative.components().count() > 1 {
            relative
                .components()
                .next()
                .map_or_else(|| root_name.clone(), |c| c.as_os_str().to_string_lossy().into_owned())
        } else {
            root_name.clone()
        };

        documents.push(SourceDocument::new(relative_path, project, content));
    }

    debug!(root = %root.display(), documents = documents.len(), "Scanned source tree");
    Ok(documents)
}

fn is_skipped(entry: &DirEntry, settings: &WatchSettings) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && settings.ignored_dirs.iter().any(|ignored| *ignored == name)
}

fn has_watched_extension(path: &Path, settings: &WatchSettings) -> bool {
    if settings.extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| settings.extensions.iter().any(|watched| watched == ext))
}
