//! Reading one directory level, split into subdirectories and files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub path: PathBuf,
    pub name: String,
    /// Zero for directories and for files whose metadata could not be read.
    pub size: u64,
}

/// One directory level, each group sorted by name.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub directories: Vec<ListedEntry>,
    pub files: Vec<ListedEntry>,
}

/// Lists `path` without following symlinks; a symlink is listed as a file.
///
/// Only a failure to open the directory is returned. Entries that fail
/// individually are skipped.
pub fn list_directory(path: &Path) -> io::Result<DirectoryListing> {
    let mut listing = DirectoryListing::default();

    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", path.display(), e);
                continue;
            }
        };
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if file_type.is_dir() {
            listing.directories.push(ListedEntry {
                path: entry.path(),
                name,
                size: 0,
            });
        } else {
            // The link itself, never its target.
            let size = fs::symlink_metadata(entry.path()).map(|m| m.len()).unwrap_or(0);
            listing.files.push(ListedEntry {
                path: entry.path(),
                name,
                size,
            });
        }
    }

    listing.directories.sort_by(|a, b| a.name.cmp(&b.name));
    listing.files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listing)
}

/// Name shown for a path; falls back to the whole path for roots like `/`.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
