//! Tri-state selection propagation over a [`FileTree`].

use super::error::CoreError;
use super::tree::{FileTree, NodeId, SelectionState, TreeNode};

/// Keeps checkbox states consistent across a tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SelectionEngine;

impl SelectionEngine {
    /// Sets `id` and every descendant to `state`, then recomputes the ancestors.
    ///
    /// Only `Checked` and `Unchecked` can be set; `Partial` is always derived.
    pub fn set_state(tree: &mut FileTree, id: NodeId, state: SelectionState) -> Result<(), CoreError> {
        if state == SelectionState::Partial {
            return Err(CoreError::PartialSelection);
        }

        let parent = tree.get(id)?.parent();
        for descendant in tree.preorder(id) {
            tree.get_mut(descendant)?.state = state;
        }

        if let Some(parent) = parent {
            Self::recompute_upward(tree, parent)?;
        }
        Ok(())
    }

    /// Flips a node the way a checkbox click does: checked becomes unchecked,
    /// anything else becomes checked.
    pub fn toggle(tree: &mut FileTree, id: NodeId) -> Result<SelectionState, CoreError> {
        let next = match tree.get(id)?.state() {
            SelectionState::Checked => SelectionState::Unchecked,
            SelectionState::Unchecked | SelectionState::Partial => SelectionState::Checked,
        };
        Self::set_state(tree, id, next)?;
        Ok(next)
    }

    /// Re-derives the state of `id` and then of each ancestor up to the root.
    ///
    /// Stops early once a node's state comes out unchanged, since nothing
    /// above it can change either.
    pub fn recompute_upward(tree: &mut FileTree, id: NodeId) -> Result<(), CoreError> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = tree.get(node_id)?;
            let derived = SelectionState::from_children(
                node.children().iter().filter_map(|c| tree.node(*c)).map(TreeNode::state),
            );
            let parent = node.parent();
            let previous = node.state();

            if let Some(derived) = derived {
                if derived == previous {
                    break;
                }
                tree.get_mut(node_id)?.state = derived;
            }
            current = parent;
        }
        Ok(())
    }

    /// Checks or unchecks the whole tree.
    pub fn select_all(tree: &mut FileTree, checked: bool) {
        let state = if checked {
            SelectionState::Checked
        } else {
            SelectionState::Unchecked
        };
        let root = tree.root();
        for id in tree.preorder(root) {
            if let Ok(node) = tree.get_mut(id) {
                node.state = state;
            }
        }
    }

    /// Returns the effectively selected files in traversal order.
    ///
    /// Unchecked directories stop the walk; checked and partial ones are
    /// descended into.
    pub fn collect_selected(tree: &FileTree) -> Vec<&TreeNode> {
        let mut selected = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if node.state() == SelectionState::Unchecked {
                continue;
            }
            if node.is_directory() {
                stack.extend(node.children().iter().rev().copied());
            } else if node.state().is_checked() {
                selected.push(node);
            }
        }
        selected
    }

    /// `true` when every node with children holds the state derived from them
    /// and no childless node is partial.
    pub fn is_consistent(tree: &FileTree) -> bool {
        tree.iter().all(|node| {
            let derived = SelectionState::from_children(
                node.children().iter().filter_map(|c| tree.node(*c)).map(TreeNode::state),
            );
            match derived {
                Some(derived) => derived == node.state(),
                None => node.state() != SelectionState::Partial,
            }
        })
    }

    pub fn toggle_expanded(tree: &mut FileTree, id: NodeId) -> Result<bool, CoreError> {
        let node = tree.get_mut(id)?;
        node.expanded = !node.expanded;
        Ok(node.expanded)
    }

    pub fn expand_all(tree: &mut FileTree) {
        Self::set_expanded_everywhere(tree, true);
    }

    pub fn collapse_all(tree: &mut FileTree) {
        Self::set_expanded_everywhere(tree, false);
    }

    fn set_expanded_everywhere(tree: &mut FileTree, expanded: bool) {
        let root = tree.root();
        for id in tree.preorder(root) {
            if let Ok(node) = tree.get_mut(id) {
                if node.is_directory() {
                    node.expanded = expanded;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};
    use SelectionState::*;

    /// root
    /// ├── a/
    /// │   ├── a1.rs
    /// │   └── b/
    /// │       ├── b1.rs
    /// │       └── b2.rs
    /// ├── c/
    /// │   └── c1.rs
    /// └── top.rs
    fn sample() -> FileTree {
        let mut tree = FileTree::new(PathBuf::from("/r"), "r".into());
        let root = tree.root();
        let a = tree.add_child(root, "/r/a".into(), "a".into(), true, 0);
        tree.add_child(a, "/r/a/a1.rs".into(), "a1.rs".into(), false, 1);
        let b = tree.add_child(a, "/r/a/b".into(), "b".into(), true, 0);
        tree.add_child(b, "/r/a/b/b1.rs".into(), "b1.rs".into(), false, 1);
        tree.add_child(b, "/r/a/b/b2.rs".into(), "b2.rs".into(), false, 1);
        let c = tree.add_child(root, "/r/c".into(), "c".into(), true, 0);
        tree.add_child(c, "/r/c/c1.rs".into(), "c1.rs".into(), false, 1);
        tree.add_child(root, "/r/top.rs".into(), "top.rs".into(), false, 1);
        tree
    }

    fn id(tree: &FileTree, path: &str) -> NodeId {
        tree.find_by_relative_path(Path::new(path)).unwrap()
    }

    fn state(tree: &FileTree, path: &str) -> SelectionState {
        tree.get(id(tree, path)).unwrap().state()
    }

    fn selected_names(tree: &FileTree) -> Vec<String> {
        SelectionEngine::collect_selected(tree)
            .iter()
            .map(|n| n.display_name().to_string())
            .collect()
    }

    #[test]
    fn test_uncheck_leaf_makes_ancestors_partial() {
        let mut tree = sample();
        let b1 = id(&tree, "a/b/b1.rs");
        SelectionEngine::set_state(&mut tree, b1, Unchecked).unwrap();

        assert_eq!(state(&tree, "a/b/b1.rs"), Unchecked);
        assert_eq!(state(&tree, "a/b"), Partial);
        assert_eq!(state(&tree, "a"), Partial);
        assert_eq!(state(&tree, ""), Partial);
        assert_eq!(state(&tree, "c"), Checked);
        assert!(SelectionEngine::is_consistent(&tree));
    }

    #[test]
    fn test_uncheck_root_then_recheck_one_leaf() {
        let mut tree = sample();
        let root = tree.root();
        SelectionEngine::set_state(&mut tree, root, Unchecked).unwrap();
        assert!(tree.iter().all(|n| n.state() == Unchecked));

        let b2 = id(&tree, "a/b/b2.rs");
        SelectionEngine::set_state(&mut tree, b2, Checked).unwrap();

        assert_eq!(state(&tree, "a/b/b2.rs"), Checked);
        assert_eq!(state(&tree, "a/b"), Partial);
        assert_eq!(state(&tree, "a"), Partial);
        assert_eq!(state(&tree, ""), Partial);
        for other in ["a/b/b1.rs", "a/a1.rs", "c", "c/c1.rs", "top.rs"] {
            assert_eq!(state(&tree, other), Unchecked, "{other}");
        }
        assert_eq!(selected_names(&tree), vec!["b2.rs"]);
    }

    #[test]
    fn test_checking_all_children_makes_parent_checked() {
        let mut tree = sample();
        let c = id(&tree, "c");
        SelectionEngine::set_state(&mut tree, c, Unchecked).unwrap();
        assert_eq!(state(&tree, ""), Partial);

        let c1 = id(&tree, "c/c1.rs");
        SelectionEngine::set_state(&mut tree, c1, Checked).unwrap();
        assert_eq!(state(&tree, "c"), Checked);
        assert_eq!(state(&tree, ""), Checked);
    }

    #[test]
    fn test_check_then_uncheck_is_not_a_toggle() {
        let mut tree = sample();
        let a = id(&tree, "a");
        SelectionEngine::set_state(&mut tree, a, Checked).unwrap();
        SelectionEngine::set_state(&mut tree, a, Unchecked).unwrap();
        for path in ["a", "a/a1.rs", "a/b", "a/b/b1.rs", "a/b/b2.rs"] {
            assert_eq!(state(&tree, path), Unchecked, "{path}");
        }
    }

    #[test]
    fn test_partial_cannot_be_set() {
        let mut tree = sample();
        let root = tree.root();
        assert!(matches!(
            SelectionEngine::set_state(&mut tree, root, Partial),
            Err(CoreError::PartialSelection)
        ));
    }

    #[test]
    fn test_toggle_partial_becomes_checked() {
        let mut tree = sample();
        let b1 = id(&tree, "a/b/b1.rs");
        SelectionEngine::set_state(&mut tree, b1, Unchecked).unwrap();
        let a = id(&tree, "a");
        assert_eq!(SelectionEngine::toggle(&mut tree, a).unwrap(), Checked);
        assert_eq!(state(&tree, "a/b/b1.rs"), Checked);
        assert_eq!(state(&tree, ""), Checked);
    }

    #[test]
    fn test_collect_selected_in_traversal_order() {
        let mut tree = sample();
        assert_eq!(
            selected_names(&tree),
            vec!["a1.rs", "b1.rs", "b2.rs", "c1.rs", "top.rs"]
        );

        let b = id(&tree, "a/b");
        SelectionEngine::set_state(&mut tree, b, Unchecked).unwrap();
        assert_eq!(selected_names(&tree), vec!["a1.rs", "c1.rs", "top.rs"]);

        SelectionEngine::select_all(&mut tree, false);
        assert!(selected_names(&tree).is_empty());
    }

    #[test]
    fn test_expand_and_collapse() {
        let mut tree = sample();
        SelectionEngine::expand_all(&mut tree);
        assert!(tree.iter().filter(|n| n.is_directory()).all(|n| n.is_expanded()));
        assert!(tree.iter().filter(|n| !n.is_directory()).all(|n| !n.is_expanded()));

        SelectionEngine::collapse_all(&mut tree);
        assert!(tree.iter().all(|n| !n.is_expanded()));

        let a = id(&tree, "a");
        assert!(SelectionEngine::toggle_expanded(&mut tree, a).unwrap());
    }

    proptest! {
        #[test]
        fn invariant_holds_after_random_toggles(
            toggles in proptest::collection::vec((0usize..9, any::<bool>()), 1..40)
        ) {
            let mut tree = sample();
            let ids: Vec<NodeId> = tree.iter().map(|n| n.id()).collect();
            for (index, checked) in toggles {
                let target = ids[index % ids.len()];
                let state = if checked { Checked } else { Unchecked };
                SelectionEngine::set_state(&mut tree, target, state).unwrap();
                prop_assert!(SelectionEngine::is_consistent(&tree));
            }
        }

        #[test]
        fn collected_files_are_exactly_checked_files(
            toggles in proptest::collection::vec((0usize..9, any::<bool>()), 0..20)
        ) {
            let mut tree = sample();
            let ids: Vec<NodeId> = tree.iter().map(|n| n.id()).collect();
            for (index, checked) in toggles {
                let state = if checked { Checked } else { Unchecked };
                SelectionEngine::set_state(&mut tree, ids[index % ids.len()], state).unwrap();
            }
            let mut collected: Vec<NodeId> =
                SelectionEngine::collect_selected(&tree).iter().map(|n| n.id()).collect();
            let mut expected: Vec<NodeId> = tree
                .iter()
                .filter(|n| !n.is_directory() && n.state() == Checked)
                .map(|n| n.id())
                .collect();
            collected.sort();
            expected.sort();
            prop_assert_eq!(collected, expected);
        }
    }
}
