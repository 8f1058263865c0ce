use std::fmt;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Size of a node card in canvas coordinates.
pub const NODE_SIZE: Vec2 = Vec2::new(240., 96.);

/// Category of an execution stage. Controls color and icon only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Prompt,
    Model,
    Tool,
    Memory,
    Output,
    Error,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Prompt,
        NodeType::Model,
        NodeType::Tool,
        NodeType::Memory,
        NodeType::Output,
        NodeType::Error,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Prompt => "Prompt",
            NodeType::Model => "Model",
            NodeType::Tool => "Tool",
            NodeType::Memory => "Memory",
            NodeType::Output => "Output",
            NodeType::Error => "Error",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Execution status of a node at some playback step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Error => "error",
        }
    }

    /// Whether outgoing connections of a node with this status are drawn.
    pub fn emits_edges(self) -> bool {
        matches!(self, Status::Completed | Status::Processing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub latency_ms: u32,
    pub token_count: u32,
    /// In `0.0..=1.0`.
    pub confidence: f32,
}

impl NodeMetrics {
    pub fn new(latency_ms: u32, token_count: u32, confidence: f32) -> Self {
        Self {
            latency_ms,
            token_count,
            confidence: confidence.clamp(0., 1.),
        }
    }

    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.
    }
}

/// One stage of an execution session.
///
/// Nodes are static: their location never changes and their status is derived
/// from the playback step, see [`crate::project_status`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionNode {
    id: String,
    node_type: NodeType,
    title: String,
    content: String,
    location: Pos2,
    ordinal: usize,
    metrics: NodeMetrics,
    connections: Vec<String>,

    /// Wins over the step-derived status when set.
    status_override: Option<Status>,
    /// Start of the stage relative to the session start.
    started_at_offset_ms: u64,
}

impl ExecutionNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            node_type,
            title: String::default(),
            content: String::default(),
            location: Pos2::ZERO,
            ordinal,
            metrics: NodeMetrics::default(),
            connections: Vec::new(),
            status_override: None,
            started_at_offset_ms: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_location(mut self, location: Pos2) -> Self {
        self.location = location;
        self
    }

    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_connections<I, S>(mut self, connections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections = connections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status_override(mut self, status: Status) -> Self {
        self.status_override = Some(status);
        self
    }

    pub fn with_started_at_offset_ms(mut self, offset: u64) -> Self {
        self.started_at_offset_ms = offset;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn location(&self) -> Pos2 {
        self.location
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn metrics(&self) -> NodeMetrics {
        self.metrics
    }

    pub fn connections(&self) -> &[String] {
        &self.connections
    }

    pub fn status_override(&self) -> Option<Status> {
        self.status_override
    }

    pub fn started_at_offset_ms(&self) -> u64 {
        self.started_at_offset_ms
    }

    /// Point where outgoing edges leave the card.
    pub fn output_anchor(&self) -> Pos2 {
        self.location + Vec2::new(NODE_SIZE.x, NODE_SIZE.y / 2.)
    }

    /// Point where incoming edges enter the card.
    pub fn input_anchor(&self) -> Pos2 {
        self.location + Vec2::new(0., NODE_SIZE.y / 2.)
    }
}
