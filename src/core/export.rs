//! Writers that receive the selected files of a tree.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;

use super::error::CoreError;
use super::tree::TreeNode;
use crate::utils::file_detection::{is_text_file, MAX_TEXT_FILE_SIZE};

/// A file that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub relative_path: PathBuf,
    pub reason: String,
}

/// Outcome of one export. Individual failures do not abort the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub destination: PathBuf,
    pub exported: usize,
    /// Files whose path could not be placed safely under the destination.
    pub skipped: usize,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Receives the selected file nodes of a tree rooted at `root`.
pub trait Exporter {
    fn export(&self, root: &Path, selected: &[&TreeNode]) -> Result<ExportReport, CoreError>;
}

/// Relative path of `path` under `root` with only normal components.
///
/// Returns `None` for paths outside `root`, paths with `..`, and the root itself.
pub fn sanitize_relative_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let relative = path.strip_prefix(root).ok()?;
    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

fn display_relative(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Copies selected files below a destination directory, keeping their
/// relative layout. Copies run in parallel.
pub struct DirectoryExporter {
    destination: PathBuf,
}

impl DirectoryExporter {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

impl Exporter for DirectoryExporter {
    fn export(&self, root: &Path, selected: &[&TreeNode]) -> Result<ExportReport, CoreError> {
        fs::create_dir_all(&self.destination).map_err(|e| CoreError::Io(e, self.destination.clone()))?;

        let mut skipped = 0;
        let mut jobs = Vec::with_capacity(selected.len());
        for node in selected {
            match sanitize_relative_path(root, node.full_path()) {
                Some(relative) => jobs.push((node.full_path().to_path_buf(), relative)),
                None => {
                    tracing::warn!("Skipping {}: not a safe path under the root", node.full_path().display());
                    skipped += 1;
                }
            }
        }

        let failures = Mutex::new(Vec::new());
        let exported = jobs
            .par_iter()
            .filter(|(source, relative)| {
                let target = self.destination.join(relative);
                let copied = target
                    .parent()
                    .map_or(Ok(()), fs::create_dir_all)
                    .and_then(|()| fs::copy(source, &target));
                match copied {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::debug!("Failed to copy {}: {}", source.display(), e);
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(ExportFailure {
                                relative_path: relative.clone(),
                                reason: e.to_string(),
                            });
                        false
                    }
                }
            })
            .count();

        let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        failures.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        tracing::info!(
            "Copied {} files to {} ({} failed, {} skipped)",
            exported,
            self.destination.display(),
            failures.len(),
            skipped
        );
        Ok(ExportReport {
            destination: self.destination.clone(),
            exported,
            skipped,
            failures,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

/// Concatenates the selected files into a single text or Markdown document.
pub struct TextExporter {
    output: PathBuf,
    format: TextFormat,
}

const SEPARATOR_WIDTH: usize = 80;

impl TextExporter {
    pub fn new(output: impl Into<PathBuf>, format: TextFormat) -> Self {
        Self {
            output: output.into(),
            format,
        }
    }

    /// Builds the document without writing it.
    pub fn render_document(&self, root: &Path, selected: &[&TreeNode]) -> (String, ExportReport) {
        let mut content = String::new();
        let mut report = ExportReport {
            destination: self.output.clone(),
            ..Default::default()
        };
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M");

        match self.format {
            TextFormat::Plain => {
                content.push_str("# DevTool Vault export\n");
                content.push_str(&format!("# Generated: {now}\n"));
                content.push_str(&format!("# Files: {}\n\n", selected.len()));
            }
            TextFormat::Markdown => {
                content.push_str("# Exported code\n\n");
                content.push_str(&format!("*Exported at: {now}*\n\n"));
            }
        }

        for node in selected {
            let path = node.full_path();
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            let shown = display_relative(&relative);

            let body = match Self::read_text(path) {
                Ok(body) => {
                    report.exported += 1;
                    body
                }
                Err(e) => {
                    report.failures.push(ExportFailure {
                        relative_path: relative,
                        reason: e.to_string(),
                    });
                    format!("// Error reading {shown}: {e}\n")
                }
            };

            match self.format {
                TextFormat::Plain => {
                    content.push_str(&format!("// File: {shown}\n"));
                    content.push_str(&body);
                }
                TextFormat::Markdown => {
                    content.push_str(&format!("<!-- File: {shown} -->\n```\n"));
                    content.push_str(&body);
                    content.push_str("```\n");
                }
            }
            content.push_str(&format!("\n{}\n\n", "-".repeat(SEPARATOR_WIDTH)));
        }

        (content, report)
    }

    /// File content ready to be inlined, always ending with a newline.
    fn read_text(path: &Path) -> std::io::Result<String> {
        let size = fs::metadata(path)?.len();
        if size > MAX_TEXT_FILE_SIZE {
            return Ok(format!("[file too large: {size} bytes, content skipped]\n"));
        }
        if !is_text_file(path)? {
            return Ok("[binary file, content skipped]\n".to_string());
        }

        let bytes = fs::read(path)?;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

impl Exporter for TextExporter {
    fn export(&self, root: &Path, selected: &[&TreeNode]) -> Result<ExportReport, CoreError> {
        if self.output.is_dir() {
            return Err(CoreError::Export(format!(
                "{} is a directory, expected a file",
                self.output.display()
            )));
        }
        let (content, report) = self.render_document(root, selected);
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::Io(e, parent.to_path_buf()))?;
        }
        fs::write(&self.output, content).map_err(|e| CoreError::Io(e, self.output.clone()))?;

        tracing::info!(
            "Wrote {} files to {} ({} failed)",
            report.exported,
            self.output.display(),
            report.failures.len()
        );
        Ok(report)
    }
}
