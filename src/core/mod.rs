pub mod error;
pub mod export;
pub mod filter;
pub mod listing;
pub mod pattern;
pub mod selection;
pub mod stats;
pub mod tree;
pub mod tree_builder;
pub mod tree_generator;

pub use error::CoreError;
pub use export::{DirectoryExporter, ExportReport, Exporter, TextExporter, TextFormat};
pub use filter::{AttributeProbe, FilterPolicy, FsAttributeProbe};
pub use pattern::{matches, PatternSet};
pub use selection::SelectionEngine;
pub use stats::Statistics;
pub use tree::{FileTree, NodeId, SelectionState, TreeNode};
pub use tree_builder::{BuildOutput, TreeBuilder};
pub use tree_generator::{RenderOutput, TreeGenerator};
