mod elements;
mod error;
mod filter;
mod graph;
mod playback;
mod projection;
mod selection;
mod session;
mod settings;
mod snapshot;
mod view;
mod viewport;

pub mod keybindings;
pub mod mock;

pub use self::elements::{ExecutionEdge, ExecutionNode, NodeMetrics, NodeType, Status, NODE_SIZE};
pub use self::error::{ExportError, GraphError, PlaybackError};
pub use self::filter::{filter_visible, FilterState, VisibleSet};
pub use self::graph::ExecutionGraph;
pub use self::playback::{ExecutionMode, PlaybackState, Seek, StepClock};
pub use self::projection::{
    content_preview, format_duration, progress, project_edges, project_nodes, project_status,
    project_timeline, ProjectedNode, TimelineEntry,
};
pub use self::selection::{ContentStats, LogEntry, LogLevel, NodeDetail, Selection};
pub use self::session::{Frame, Summary, VisualizerSession};
pub use self::settings::{
    SettingsInteraction, SettingsNavigation, SettingsPlayback, SettingsStyle, BASE_INTERVAL_MAX,
    SPEED_MAX, SPEED_MIN, ZOOM_MAX, ZOOM_MIN,
};
pub use self::snapshot::{exporter_for, ExportFormat, JsonExporter, Snapshot, SnapshotExporter};
pub use self::view::{node_at, node_colors, status_color, ExecutionView};
pub use self::viewport::{Viewport, ViewportState};

#[cfg(feature = "events")]
pub mod events;
