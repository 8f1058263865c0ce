use serde::{Deserialize, Serialize};

/// Connection between two execution stages.
///
/// Edges are never stored. They are derived for a playback step by
/// [`crate::project_edges`] and exist only while the source node is running
/// or finished.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionEdge {
    pub from: String,
    pub to: String,
    /// Set while the source node is still processing.
    pub animated: bool,
}

impl ExecutionEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, animated: bool) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            animated,
        }
    }
}
