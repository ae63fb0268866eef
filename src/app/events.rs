//! Events sent from the session to whoever drives it.

use crate::core::Statistics;

use super::view_model::TreeView;

#[derive(Debug)]
pub enum UserEvent {
    /// A build finished and its tree is now the session's tree.
    TreeReady { generation: u64, stats: Statistics },
    /// A render finished; the text is also kept in the session.
    RenderReady {
        generation: u64,
        text: String,
        stats: Statistics,
    },
    /// A selection or expansion change, with the updated tree.
    SelectionChanged(Box<TreeView>),
    /// A generation failed.
    ShowError { generation: u64, message: String },
}

impl UserEvent {
    /// The generation an event reports on, if it belongs to one.
    pub fn generation(&self) -> Option<u64> {
        match self {
            UserEvent::TreeReady { generation, .. }
            | UserEvent::RenderReady { generation, .. }
            | UserEvent::ShowError { generation, .. } => Some(*generation),
            UserEvent::SelectionChanged(_) => None,
        }
    }
}
