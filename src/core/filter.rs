//! Per-path include/exclude decisions for one filtering pass.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::pattern::{Candidate, PatternSet};
use crate::config::ResolvedConfig;

/// The filesystem attributes that hide an entry unless system files are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub hidden: bool,
    pub system: bool,
    pub temporary: bool,
    pub offline: bool,
}

impl FileAttributes {
    pub fn is_concealed(&self) -> bool {
        self.hidden || self.system || self.temporary || self.offline
    }
}

/// Source of [`FileAttributes`] for a path.
pub trait AttributeProbe: Send + Sync {
    fn attributes(&self, path: &Path) -> io::Result<FileAttributes>;
}

/// Reads attributes from the filesystem without following symlinks.
///
/// On Windows the hidden, system, temporary and offline attribute bits are
/// used. Elsewhere only "hidden" exists, meaning a name starting with `.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttributeProbe;

impl AttributeProbe for FsAttributeProbe {
    fn attributes(&self, path: &Path) -> io::Result<FileAttributes> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(platform_attributes(path, &metadata))
    }
}

#[cfg(windows)]
fn platform_attributes(_path: &Path, metadata: &fs::Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;
    const FILE_ATTRIBUTE_TEMPORARY: u32 = 0x100;
    const FILE_ATTRIBUTE_OFFLINE: u32 = 0x1000;

    let bits = metadata.file_attributes();
    FileAttributes {
        hidden: bits & FILE_ATTRIBUTE_HIDDEN != 0,
        system: bits & FILE_ATTRIBUTE_SYSTEM != 0,
        temporary: bits & FILE_ATTRIBUTE_TEMPORARY != 0,
        offline: bits & FILE_ATTRIBUTE_OFFLINE != 0,
    }
}

#[cfg(not(windows))]
fn platform_attributes(path: &Path, _metadata: &fs::Metadata) -> FileAttributes {
    let hidden = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    FileAttributes {
        hidden,
        ..Default::default()
    }
}

/// Extension of a file name from its last dot, lowercased and including the dot.
///
/// `.gitignore` yields `.gitignore`; `Makefile` and `name.` yield `None`.
pub fn dotted_extension(name: &str) -> Option<String> {
    let index = name.rfind('.')?;
    if index + 1 == name.len() {
        return None;
    }
    Some(name[index..].to_lowercase())
}

/// Decides which paths below a root are excluded, for one [`ResolvedConfig`].
#[derive(Clone)]
pub struct FilterPolicy {
    root: PathBuf,
    config: ResolvedConfig,
    patterns: PatternSet,
    probe: Arc<dyn AttributeProbe>,
}

impl std::fmt::Debug for FilterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPolicy")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FilterPolicy {
    pub fn new(root: impl Into<PathBuf>, config: ResolvedConfig) -> Self {
        let patterns = PatternSet::new(&config.ignore_patterns);
        Self {
            root: root.into(),
            config,
            patterns,
            probe: Arc::new(FsAttributeProbe),
        }
    }

    /// Replaces the attribute source.
    pub fn with_probe(mut self, probe: Arc<dyn AttributeProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Returns `true` if `path` must not appear in the tree.
    pub fn should_exclude(&self, path: &Path, is_directory: bool) -> bool {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if !is_directory && self.config.show_only_code_files && !self.is_code_name(&name) {
            tracing::trace!("Excluding {} (not a code file)", path.display());
            return true;
        }

        let candidate = Candidate::new(&name, &self.relative_path(path));
        if let Some(pattern) = self.patterns.first_match(&candidate) {
            tracing::trace!("Excluding {} (pattern {:?})", path.display(), pattern);
            return true;
        }

        if !self.config.show_system_files {
            match self.probe.attributes(path) {
                Ok(attributes) if attributes.is_concealed() => {
                    tracing::trace!("Excluding {} ({:?})", path.display(), attributes);
                    return true;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Excluding {}: attributes unavailable: {}", path.display(), e);
                    return true;
                }
            }
        }

        false
    }

    /// `true` if the file's extension is in the code-extension set.
    pub fn is_code_file(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.is_code_name(&name.to_string_lossy()))
    }

    fn is_code_name(&self, name: &str) -> bool {
        dotted_extension(name).is_some_and(|ext| self.config.code_extensions.contains(&ext))
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Attribute source driven by a fixed set of names.
    #[derive(Default)]
    struct FakeProbe {
        hidden: HashSet<String>,
        failing: HashSet<String>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl AttributeProbe for FakeProbe {
        fn attributes(&self, path: &Path) -> io::Result<FileAttributes> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.failing.contains(&name) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(FileAttributes {
                hidden: self.hidden.contains(&name),
                ..Default::default()
            })
        }
    }

    fn config(patterns: &[&str]) -> ResolvedConfig {
        ResolvedConfig {
            ignore_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    fn policy(config: ResolvedConfig, probe: FakeProbe) -> FilterPolicy {
        FilterPolicy::new("/project", config).with_probe(Arc::new(probe))
    }

    #[test]
    fn test_dotted_extension() {
        assert_eq!(dotted_extension("Program.CS").as_deref(), Some(".cs"));
        assert_eq!(dotted_extension("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(dotted_extension(".gitignore").as_deref(), Some(".gitignore"));
        assert_eq!(dotted_extension("Makefile"), None);
        assert_eq!(dotted_extension("trailing."), None);
    }

    #[test]
    fn test_directory_excluded_by_pattern() {
        let p = policy(config(&["bin", "*.dll"]), FakeProbe::default());
        assert!(p.should_exclude(Path::new("/project/bin"), true));
        assert!(p.should_exclude(Path::new("/project/src/BIN"), true));
        assert!(!p.should_exclude(Path::new("/project/src"), true));
    }

    #[test]
    fn test_code_only_filter_applies_to_files_not_directories() {
        let cfg = ResolvedConfig {
            show_only_code_files: true,
            ..config(&[])
        }
        .with_code_extensions([".cs", "RS"]);
        let p = policy(cfg, FakeProbe::default());

        assert!(!p.should_exclude(Path::new("/project/Program.cs"), false));
        assert!(!p.should_exclude(Path::new("/project/lib.RS"), false));
        assert!(p.should_exclude(Path::new("/project/README.md"), false));
        assert!(p.should_exclude(Path::new("/project/Makefile"), false));
        assert!(!p.should_exclude(Path::new("/project/docs.md"), true));
        assert!(p.is_code_file(Path::new("x/y/Main.cs")));
    }

    #[test]
    fn test_path_aware_pattern_uses_path_relative_to_root() {
        let p = policy(config(&["src/generated"]), FakeProbe::default());
        assert!(p.should_exclude(Path::new("/project/src/generated"), true));
        assert!(p.should_exclude(Path::new("/project/src/generated/a.rs"), false));
        assert!(!p.should_exclude(Path::new("/project/lib/generated"), true));
    }

    #[test]
    fn test_hidden_attribute_excludes_unless_shown() {
        let probe = FakeProbe {
            hidden: ["secret.txt".to_string()].into(),
            ..Default::default()
        };
        let p = policy(config(&[]), probe);
        assert!(p.should_exclude(Path::new("/project/secret.txt"), false));
        assert!(!p.should_exclude(Path::new("/project/open.txt"), false));

        let probe = FakeProbe {
            hidden: ["secret.txt".to_string()].into(),
            ..Default::default()
        };
        let shown = policy(
            ResolvedConfig {
                show_system_files: true,
                ..config(&[])
            },
            probe,
        );
        assert!(!shown.should_exclude(Path::new("/project/secret.txt"), false));
    }

    #[test]
    fn test_attribute_failure_is_fail_closed() {
        let probe = FakeProbe {
            failing: ["locked".to_string()].into(),
            ..Default::default()
        };
        let p = policy(config(&[]), probe);
        assert!(p.should_exclude(Path::new("/project/locked"), true));
        assert!(p.should_exclude(Path::new("/project/sub/locked"), false));
    }

    #[test]
    fn test_attributes_not_read_when_system_files_shown() {
        let probe = Arc::new(FakeProbe::default());
        let p = FilterPolicy::new(
            "/project",
            ResolvedConfig {
                show_system_files: true,
                ..Default::default()
            },
        )
        .with_probe(probe.clone());
        assert!(!p.should_exclude(Path::new("/project/a.txt"), false));
        assert!(probe.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_filesystem_probe_fails_for_missing_path() {
        let dir = tempdir().unwrap();
        let p = FilterPolicy::new(dir.path(), ResolvedConfig::default());
        assert!(p.should_exclude(&dir.path().join("does-not-exist.txt"), false));

        std::fs::write(dir.path().join("present.txt"), "x").unwrap();
        assert!(!p.should_exclude(&dir.path().join("present.txt"), false));
    }

    #[cfg(unix)]
    #[test]
    fn test_filesystem_probe_treats_dotfiles_as_hidden() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "x").unwrap();
        let p = FilterPolicy::new(dir.path(), ResolvedConfig::default());
        assert!(p.should_exclude(&dir.path().join(".env"), false));
    }
}
