//! Generates an ASCII representation of a directory tree.

use std::io;
use std::path::Path;
use std::time::Instant;

use super::error::CoreError;
use super::filter::FilterPolicy;
use super::listing::list_directory;
use super::stats::{format_file_size, Statistics};
use crate::config::ResolvedConfig;

/// Rendered text together with the totals of everything it shows.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub text: String,
    pub stats: Statistics,
}

/// Renders a filtered directory as an indented ASCII tree.
///
/// The renderer does its own walk of the filesystem instead of reusing a
/// built [`FileTree`](super::tree::FileTree), so its output always reflects
/// what is on disk at render time.
pub struct TreeGenerator {
    policy: FilterPolicy,
}

impl TreeGenerator {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    /// Renders `root` with the filesystem attribute probe.
    pub fn render(root: &Path, config: &ResolvedConfig) -> Result<RenderOutput, CoreError> {
        Self::new(FilterPolicy::new(root, config.clone())).run()
    }

    pub fn run(&self) -> Result<RenderOutput, CoreError> {
        let start = Instant::now();
        let root = self.policy.root();
        if !root.is_dir() {
            return Err(CoreError::NotADirectory(root.to_path_buf()));
        }
        let absolute = std::path::absolute(root).map_err(|e| CoreError::Io(e, root.to_path_buf()))?;

        let mut stats = Statistics::default();
        stats.record_folder();
        let contents = self.collect(root, &mut stats);

        let mut text = String::new();
        text.push_str(&format!("{}\n", absolute.display()));
        Self::emit(&contents, "", self.policy.config().show_file_size, &mut text);

        tracing::info!(
            "Rendered tree for {} in {:?}: {}",
            root.display(),
            start.elapsed(),
            stats.summary()
        );
        Ok(RenderOutput { text, stats })
    }

    /// Gathers the visible children of `dir`, files first.
    ///
    /// A subdirectory is only counted once it is known to be kept, which
    /// requires its own contents to be collected first.
    fn collect(&self, dir: &Path, stats: &mut Statistics) -> Contents {
        let listing = match list_directory(dir) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::debug!("Cannot list {}: {}", dir.display(), e);
                return Contents::unlisted(&e);
            }
        };

        let mut entries = Vec::new();
        for file in listing.files {
            if self.policy.should_exclude(&file.path, false) {
                continue;
            }
            stats.record_file(file.size);
            entries.push(Entry::File {
                name: file.name,
                size: file.size,
            });
        }

        for subdir in listing.directories {
            if self.policy.should_exclude(&subdir.path, true) {
                continue;
            }
            let contents = self.collect(&subdir.path, stats);
            if matches!(contents, Contents::Empty) && self.policy.config().ignore_empty_folders {
                tracing::trace!("Omitting empty folder {}", subdir.path.display());
                continue;
            }
            stats.record_folder();
            entries.push(Entry::Directory {
                name: subdir.name,
                contents,
            });
        }

        if entries.is_empty() {
            Contents::Empty
        } else {
            Contents::Entries(entries)
        }
    }

    fn emit(contents: &Contents, prefix: &str, show_size: bool, result: &mut String) {
        let entries = match contents {
            Contents::Entries(entries) => entries,
            Contents::Empty => return Self::emit_marker(prefix, "[empty]", result),
            Contents::AccessDenied => return Self::emit_marker(prefix, "[access denied]", result),
            Contents::ReadError => return Self::emit_marker(prefix, "[read error]", result),
        };

        for (i, entry) in entries.iter().enumerate() {
            let is_last = i == entries.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            match entry {
                Entry::File { name, size } => {
                    let size = if show_size {
                        format!(" ({})", format_file_size(*size))
                    } else {
                        String::new()
                    };
                    result.push_str(&format!("{prefix}{connector}{name}{size}\n"));
                }
                Entry::Directory { name, contents } => {
                    result.push_str(&format!("{prefix}{connector}{name}/\n"));
                    let new_prefix = if is_last {
                        format!("{prefix}    ")
                    } else {
                        format!("{prefix}│   ")
                    };
                    Self::emit(contents, &new_prefix, show_size, result);
                }
            }
        }
    }

    fn emit_marker(prefix: &str, marker: &str, result: &mut String) {
        result.push_str(&format!("{prefix}└── {marker}\n"));
    }
}

/// A visible child collected before any text is emitted.
#[derive(Debug)]
enum Entry {
    File { name: String, size: u64 },
    Directory { name: String, contents: Contents },
}

#[derive(Debug)]
enum Contents {
    Entries(Vec<Entry>),
    Empty,
    AccessDenied,
    ReadError,
}

impl Contents {
    /// Marker for a directory whose listing failed.
    fn unlisted(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Contents::AccessDenied,
            _ => Contents::ReadError,
        }
    }
}
