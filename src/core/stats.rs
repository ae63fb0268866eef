//! Running totals collected while building or rendering a tree.

use serde::Serialize;

/// File, folder and byte counts for one pass. Reset before every pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_files: usize,
    pub total_folders: usize,
    pub total_size_bytes: u64,
}

impl Statistics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_file(&mut self, size: u64) {
        self.total_files += 1;
        self.total_size_bytes += size;
    }

    pub fn record_folder(&mut self) {
        self.total_folders += 1;
    }

    /// One-line summary, e.g. `3 folders, 12 files, 48.2 KB`.
    pub fn summary(&self) -> String {
        format!(
            "{} folders, {} files, {}",
            self.total_folders,
            self.total_files,
            format_file_size(self.total_size_bytes)
        )
    }
}

/// Formats a byte count with 1024-based units and one decimal place.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
