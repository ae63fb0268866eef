//! Serializable snapshot of a session's tree for JSON consumers.

use serde::Serialize;

use crate::core::{FileTree, SelectionState, Statistics, TreeNode};

use super::state::SessionState;

/// The loaded tree with its statistics.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub profile: String,
    pub root_path: String,
    pub stats: Statistics,
    pub selected_files_count: usize,
    pub root: NodeView,
}

/// A single node of the [`TreeView`].
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub name: String,
    /// Path relative to the root with `/` separators; empty for the root.
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    pub state: SelectionState,
    pub is_expanded: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_unreachable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

/// Creates the `TreeView` for the session's current tree, if one is loaded.
pub fn generate_tree_view(state: &SessionState) -> Option<TreeView> {
    let tree = state.tree.as_ref()?;
    let selected_files_count = tree
        .iter()
        .filter(|n| !n.is_directory() && n.state().is_checked())
        .count();

    Some(TreeView {
        profile: state.profile_name.clone(),
        root_path: tree.root_node().full_path().display().to_string(),
        stats: state.stats,
        selected_files_count,
        root: build_node_view(tree, tree.root_node(), String::new()),
    })
}

fn build_node_view(tree: &FileTree, node: &TreeNode, path: String) -> NodeView {
    let children = node
        .children()
        .iter()
        .filter_map(|child| tree.node(*child))
        .map(|child| {
            let child_path = if path.is_empty() {
                child.display_name().to_string()
            } else {
                format!("{}/{}", path, child.display_name())
            };
            build_node_view(tree, child, child_path)
        })
        .collect();

    NodeView {
        name: node.display_name().to_string(),
        path,
        is_directory: node.is_directory(),
        size: node.size(),
        state: node.state(),
        is_expanded: node.is_expanded(),
        is_unreachable: node.is_unreachable(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::core::{SelectionEngine, TreeBuilder};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_no_view_without_tree() {
        assert!(generate_tree_view(&SessionState::default()).is_none());
    }

    #[test]
    fn test_view_mirrors_tree_and_serializes_states() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.rs"), "a").unwrap();
        fs::write(dir.path().join("src/b.rs"), "bb").unwrap();

        let mut output = TreeBuilder::build(dir.path(), &ResolvedConfig::default()).unwrap();
        let a = output.tree.find_by_relative_path(Path::new("src/a.rs")).unwrap();
        SelectionEngine::set_state(&mut output.tree, a, SelectionState::Unchecked).unwrap();

        let mut state = SessionState::default();
        state.stats = output.stats;
        state.tree = Some(output.tree);
        let view = generate_tree_view(&state).unwrap();

        assert_eq!(view.selected_files_count, 1);
        let src = &view.root.children[0];
        assert_eq!(src.path, "src");
        assert_eq!(src.state, SelectionState::Partial);
        assert_eq!(src.children[1].path, "src/b.rs");
        assert_eq!(src.children[1].size, 2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["profile"], "Default");
        assert_eq!(json["root"]["state"], "partial");
        assert_eq!(json["root"]["children"][0]["children"][0]["state"], "unchecked");
        assert_eq!(json["root"]["children"][0]["isDirectory"], true);
        assert!(json["root"]["children"][0]["children"][0].get("children").is_none());
        assert_eq!(json["stats"]["totalFiles"], 2);
    }
}
