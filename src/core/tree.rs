//! The checkable file tree.
//!
//! Nodes live in a single arena owned by [`FileTree`]. Children and parents are
//! referenced by [`NodeId`], so the parent link never owns anything and the
//! structure cannot form reference cycles.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::CoreError;

/// Index of a node inside its [`FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tri-state checkbox value of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    Checked,
    Unchecked,
    /// Some, but not all, descendants are checked. Only ever derived.
    Partial,
}

impl SelectionState {
    /// Derives a parent's state from its children's states.
    ///
    /// Returns `None` when there are no children.
    pub fn from_children<I>(states: I) -> Option<SelectionState>
    where
        I: IntoIterator<Item = SelectionState>,
    {
        let mut result = None;
        for state in states {
            result = match (result, state) {
                (_, SelectionState::Partial) => return Some(SelectionState::Partial),
                (None, s) => Some(s),
                (Some(prev), s) if prev == s => Some(s),
                _ => return Some(SelectionState::Partial),
            };
        }
        result
    }

    pub fn is_checked(self) -> bool {
        self == SelectionState::Checked
    }
}

/// A single file or directory in the tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    full_path: PathBuf,
    display_name: String,
    is_directory: bool,
    size: u64,
    pub(crate) state: SelectionState,
    pub(crate) expanded: bool,
    unreachable: bool,
    pub(crate) children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// File size in bytes; zero for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// `true` for a directory whose listing failed while building.
    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Arena-backed tree of [`TreeNode`]s rooted at the scanned directory.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
}

impl FileTree {
    /// Creates a tree holding only a checked, expanded root directory.
    pub fn new(root_path: PathBuf, display_name: String) -> Self {
        let root = TreeNode {
            id: NodeId(0),
            full_path: root_path,
            display_name,
            is_directory: true,
            size: 0,
            state: SelectionState::Checked,
            expanded: true,
            unreachable: false,
            children: Vec::new(),
            parent: None,
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Like [`FileTree::node`], but reports foreign ids as an error.
    pub fn get(&self, id: NodeId) -> Result<&TreeNode, CoreError> {
        self.node(id).ok_or(CoreError::UnknownNode(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode, CoreError> {
        self.nodes.get_mut(id.0).ok_or(CoreError::UnknownNode(id))
    }

    /// Appends a new checked node under `parent`.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        full_path: PathBuf,
        display_name: String,
        is_directory: bool,
        size: u64,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            id,
            full_path,
            display_name,
            is_directory,
            size,
            state: SelectionState::Checked,
            expanded: false,
            unreachable: false,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn mark_unreachable(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.unreachable = true;
        }
    }

    /// Path of `id` relative to the root, built from display names.
    /// The root itself yields an empty path.
    pub fn relative_path(&self, id: NodeId) -> Result<PathBuf, CoreError> {
        let mut names = Vec::new();
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            names.push(current.display_name.as_str());
            current = self.get(parent)?;
        }
        Ok(names.iter().rev().collect())
    }

    /// Looks a node up by the path relative to the root.
    pub fn find_by_relative_path(&self, relative: &Path) -> Option<NodeId> {
        let mut current = self.root();
        for component in relative.components() {
            let name = component.as_os_str().to_string_lossy();
            if name == "." {
                continue;
            }
            current = *self
                .node(current)?
                .children
                .iter()
                .find(|child| self.nodes[child.0].display_name == name)?;
        }
        Some(current)
    }

    /// Ids of `id` and all of its descendants in pre-order.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }
}
