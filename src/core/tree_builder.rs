//! Builds a checkable [`FileTree`] from a directory on disk.

use std::path::Path;
use std::time::Instant;

use super::error::CoreError;
use super::filter::FilterPolicy;
use super::listing::{display_name, list_directory};
use super::stats::Statistics;
use super::tree::FileTree;
use crate::config::ResolvedConfig;

/// The result of one build pass.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub tree: FileTree,
    pub stats: Statistics,
}

/// Walks a directory depth-first and keeps every entry the policy allows.
///
/// Within a directory, subdirectories come before files and each group is
/// sorted by name. The root is never filtered. A directory that cannot be
/// listed stays in the tree with no children and is marked unreachable.
pub struct TreeBuilder {
    policy: FilterPolicy,
}

impl TreeBuilder {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    /// Builds the tree for `root` with the filesystem attribute probe.
    pub fn build(root: &Path, config: &ResolvedConfig) -> Result<BuildOutput, CoreError> {
        Self::new(FilterPolicy::new(root, config.clone())).run()
    }

    pub fn run(&self) -> Result<BuildOutput, CoreError> {
        let start = Instant::now();
        let root = self.policy.root();
        if !root.is_dir() {
            return Err(CoreError::NotADirectory(root.to_path_buf()));
        }

        let mut tree = FileTree::new(root.to_path_buf(), display_name(root));
        let mut stats = Statistics::default();
        stats.record_folder();

        let mut pending = vec![tree.root()];
        while let Some(dir_id) = pending.pop() {
            let dir_path = tree.get(dir_id)?.full_path().to_path_buf();
            let listing = match list_directory(&dir_path) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::debug!("Cannot list {}: {}", dir_path.display(), e);
                    tree.mark_unreachable(dir_id);
                    continue;
                }
            };

            let mut subdirectories = Vec::with_capacity(listing.directories.len());
            for entry in listing.directories {
                if self.policy.should_exclude(&entry.path, true) {
                    continue;
                }
                let id = tree.add_child(dir_id, entry.path, entry.name, true, 0);
                stats.record_folder();
                subdirectories.push(id);
            }

            for entry in listing.files {
                if self.policy.should_exclude(&entry.path, false) {
                    continue;
                }
                tree.add_child(dir_id, entry.path, entry.name, false, entry.size);
                stats.record_file(entry.size);
            }

            // Reversed so the first subdirectory is expanded next.
            pending.extend(subdirectories.into_iter().rev());
        }

        tracing::info!(
            "Built tree for {} in {:?}: {}",
            root.display(),
            start.elapsed(),
            stats.summary()
        );
        Ok(BuildOutput { tree, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::SelectionEngine;
    use crate::core::tree::SelectionState;
    use crate::utils::test_helpers::{running_as_root, setup_test_logging};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn project(files: &[&str], dirs: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for d in dirs {
            fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        for f in files {
            let path = dir.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "content").unwrap();
        }
        dir
    }

    fn relative_paths(output: &BuildOutput) -> Vec<PathBuf> {
        let tree = &output.tree;
        tree.preorder(tree.root())
            .into_iter()
            .skip(1)
            .map(|id| tree.relative_path(id).unwrap())
            .collect()
    }

    #[test]
    fn test_code_only_profile_example() {
        setup_test_logging();
        let dir = project(&["Program.cs", "bin/App.dll", "README.md"], &[]);
        let config = ResolvedConfig {
            ignore_patterns: vec!["bin".into(), "obj".into(), "*.dll".into()],
            show_only_code_files: true,
            ..Default::default()
        }
        .with_code_extensions([".cs"]);

        let output = TreeBuilder::build(dir.path(), &config).unwrap();
        assert_eq!(relative_paths(&output), vec![PathBuf::from("Program.cs")]);
        assert_eq!(output.stats.total_files, 1);
        assert_eq!(output.stats.total_folders, 1);
        assert_eq!(output.stats.total_size_bytes, "content".len() as u64);
    }

    #[test]
    fn test_directories_before_files_sorted_by_name() {
        let dir = project(&["b.txt", "a.txt", "zdir/x.txt", "adir/y.txt"], &[]);
        let output = TreeBuilder::build(dir.path(), &ResolvedConfig::default()).unwrap();
        let expected: Vec<PathBuf> = ["adir", "adir/y.txt", "zdir", "zdir/x.txt", "a.txt", "b.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(relative_paths(&output), expected);
        assert_eq!(output.stats.total_folders, 3);
        assert_eq!(output.stats.total_files, 4);
    }

    #[test]
    fn test_every_node_starts_checked_and_consistent() {
        let dir = project(&["src/main.rs", "src/util/mod.rs"], &["empty"]);
        let output = TreeBuilder::build(dir.path(), &ResolvedConfig::default()).unwrap();
        assert!(output.tree.iter().all(|n| n.state() == SelectionState::Checked));
        assert!(SelectionEngine::is_consistent(&output.tree));
        let empty = output.tree.find_by_relative_path(Path::new("empty")).unwrap();
        assert!(output.tree.get(empty).unwrap().children().is_empty());
    }

    #[test]
    fn test_root_is_never_filtered() {
        let dir = project(&["bin/inner.txt"], &[]);
        let root = dir.path().join("bin");
        let config = ResolvedConfig {
            ignore_patterns: vec!["bin".into()],
            ..Default::default()
        };
        let output = TreeBuilder::build(&root, &config).unwrap();
        assert_eq!(output.tree.root_node().display_name(), "bin");
        assert_eq!(relative_paths(&output), vec![PathBuf::from("inner.txt")]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let result = TreeBuilder::build(&dir.path().join("nope"), &ResolvedConfig::default());
        assert!(matches!(result, Err(CoreError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_is_kept_empty_and_unreachable() {
        use std::os::unix::fs::PermissionsExt;

        if running_as_root() {
            return;
        }
        let dir = project(&["locked/secret.txt", "open/visible.txt"], &[]);
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = TreeBuilder::build(dir.path(), &ResolvedConfig::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let output = result.unwrap();
        let tree = &output.tree;
        let locked_id = tree.find_by_relative_path(Path::new("locked")).unwrap();
        let node = tree.get(locked_id).unwrap();
        assert!(node.is_unreachable());
        assert!(node.children().is_empty());
        assert!(tree.find_by_relative_path(Path::new("open/visible.txt")).is_some());
    }
}
