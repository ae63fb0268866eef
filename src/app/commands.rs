//! Synchronous commands that act on the session's loaded tree.
//!
//! Each command takes the lock once, applies its change with the
//! [`SelectionEngine`], and notifies the proxy with the updated tree view.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::helpers::{lock_state, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::{Session, SessionState};
use crate::core::{ExportReport, Exporter, FileTree, NodeId, SelectionEngine, SelectionState};

fn loaded_tree(state: &mut SessionState) -> Result<&mut FileTree> {
    state
        .tree
        .as_mut()
        .ok_or_else(|| anyhow!("No directory has been loaded yet"))
}

fn node_at(tree: &FileTree, relative: &Path) -> Result<NodeId> {
    tree.find_by_relative_path(relative)
        .with_context(|| format!("'{}' is not part of the loaded tree", relative.display()))
}

/// Checks or unchecks the node at `relative` and everything below it.
pub fn set_node_state<P: EventProxy>(
    relative: &Path,
    checked: bool,
    proxy: &P,
    state: &Session,
) -> Result<()> {
    let target = if checked {
        SelectionState::Checked
    } else {
        SelectionState::Unchecked
    };
    with_state_and_notify(state, proxy, |s| {
        let tree = loaded_tree(s)?;
        let id = node_at(tree, relative)?;
        SelectionEngine::set_state(tree, id, target)?;
        Ok(())
    })
}

/// Flips the node at `relative` the way a checkbox click does.
pub fn toggle_selection<P: EventProxy>(
    relative: &Path,
    proxy: &P,
    state: &Session,
) -> Result<SelectionState> {
    with_state_and_notify(state, proxy, |s| {
        let tree = loaded_tree(s)?;
        let id = node_at(tree, relative)?;
        Ok(SelectionEngine::toggle(tree, id)?)
    })
}

pub fn select_all<P: EventProxy>(checked: bool, proxy: &P, state: &Session) -> Result<()> {
    with_state_and_notify(state, proxy, |s| {
        SelectionEngine::select_all(loaded_tree(s)?, checked);
        Ok(())
    })
}

/// Toggles the expanded flag of the directory at `relative`.
pub fn toggle_expansion<P: EventProxy>(relative: &Path, proxy: &P, state: &Session) -> Result<bool> {
    with_state_and_notify(state, proxy, |s| {
        let tree = loaded_tree(s)?;
        let id = node_at(tree, relative)?;
        Ok(SelectionEngine::toggle_expanded(tree, id)?)
    })
}

pub fn expand_collapse_all<P: EventProxy>(expand: bool, proxy: &P, state: &Session) -> Result<()> {
    with_state_and_notify(state, proxy, |s| {
        let tree = loaded_tree(s)?;
        if expand {
            SelectionEngine::expand_all(tree);
        } else {
            SelectionEngine::collapse_all(tree);
        }
        Ok(())
    })
}

/// Full paths of the selected files in traversal order.
pub fn selected_files(state: &Session) -> Vec<PathBuf> {
    let state_guard = lock_state(state);
    state_guard
        .tree
        .as_ref()
        .map(|tree| {
            SelectionEngine::collect_selected(tree)
                .into_iter()
                .map(|node| node.full_path().to_path_buf())
                .collect()
        })
        .unwrap_or_default()
}

/// Hands the selected files to `exporter`.
pub fn export_selection(exporter: &dyn Exporter, state: &Session) -> Result<ExportReport> {
    let state_guard = lock_state(state);
    let tree = state_guard
        .tree
        .as_ref()
        .ok_or_else(|| anyhow!("No directory has been loaded yet"))?;
    let selected = SelectionEngine::collect_selected(tree);
    let root = tree.root_node().full_path();
    exporter
        .export(root, &selected)
        .with_context(|| format!("Failed to export selection of {}", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::UserEvent;
    use crate::config::ResolvedConfig;
    use crate::core::TreeBuilder;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    fn loaded_session() -> (TempDir, Session, UnboundedSender<UserEvent>, UnboundedReceiver<UserEvent>) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();

        let output = TreeBuilder::build(dir.path(), &ResolvedConfig::default()).unwrap();
        let state = SessionState::shared("Default", ResolvedConfig::default());
        {
            let mut guard = lock_state(&state);
            guard.stats = output.stats;
            guard.tree = Some(output.tree);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        (dir, state, tx, rx)
    }

    #[test]
    fn test_unchecking_a_file_notifies_with_partial_root() {
        let (_dir, state, tx, mut rx) = loaded_session();
        set_node_state(Path::new("src/lib.rs"), false, &tx, &state).unwrap();

        match rx.try_recv().unwrap() {
            UserEvent::SelectionChanged(view) => {
                assert_eq!(view.root.state, SelectionState::Partial);
                assert_eq!(view.selected_files_count, 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
        let names: Vec<String> = selected_files(&state)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["main.rs", "README.md"]);
    }

    #[test]
    fn test_unknown_path_is_an_error_without_event() {
        let (_dir, state, tx, mut rx) = loaded_session();
        assert!(toggle_selection(Path::new("nope.rs"), &tx, &state).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_commands_need_a_loaded_tree() {
        let state = SessionState::shared("Default", ResolvedConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel::<UserEvent>();
        assert!(select_all(true, &tx, &state).is_err());
        assert!(selected_files(&state).is_empty());
    }

    #[test]
    fn test_toggle_and_select_all() {
        let (_dir, state, tx, _rx) = loaded_session();
        assert_eq!(
            toggle_selection(Path::new("src"), &tx, &state).unwrap(),
            SelectionState::Unchecked
        );
        assert_eq!(selected_files(&state).len(), 1);

        select_all(true, &tx, &state).unwrap();
        assert_eq!(selected_files(&state).len(), 3);

        assert!(toggle_expansion(Path::new("src"), &tx, &state).unwrap());
        expand_collapse_all(false, &tx, &state).unwrap();
        let guard = lock_state(&state);
        assert!(guard.tree.as_ref().unwrap().iter().all(|n| !n.is_expanded()));
    }
}
