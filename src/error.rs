use thiserror::Error;

use crate::snapshot::ExportFormat;

/// Problems found while building an [`crate::ExecutionGraph`] from node descriptions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("execution graph has no nodes")]
    Empty,

    #[error("duplicate node id `{0}`")]
    DuplicateId(String),

    #[error("node `{id}` has ordinal {ordinal}, expected {expected}; ordinals must be unique and contiguous from 0")]
    NonContiguousOrdinal {
        id: String,
        ordinal: usize,
        expected: usize,
    },

    #[error("node `{from}` connects to unknown node `{to}`")]
    UnknownConnection { from: String, to: String },

    #[error("execution graph contains a cycle")]
    Cycle,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("playback speed must be finite and positive, got {0}")]
    InvalidSpeed(f32),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0:?} export is handled outside of the visualizer")]
    Unsupported(ExportFormat),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
