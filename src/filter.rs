use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{projection::ProjectedNode, ExecutionEdge, ExecutionNode, NodeType};

/// Display-time filter over the node set. Never changes the underlying graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub visible_types: BTreeSet<NodeType>,
    /// Nodes faster than this are hidden.
    pub latency_threshold_ms: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            visible_types: NodeType::ALL.into_iter().collect(),
            latency_threshold_ms: 0,
        }
    }
}

impl FilterState {
    pub fn toggle(&mut self, node_type: NodeType, enabled: bool) {
        if enabled {
            self.visible_types.insert(node_type);
        } else {
            self.visible_types.remove(&node_type);
        }
    }

    pub fn is_type_visible(&self, node_type: NodeType) -> bool {
        self.visible_types.contains(&node_type)
    }

    pub fn visible_type_count(&self) -> usize {
        self.visible_types.len()
    }

    pub fn accepts(&self, node: &ExecutionNode) -> bool {
        self.is_type_visible(node.node_type())
            && node.metrics().latency_ms >= self.latency_threshold_ms
    }
}

/// Nodes and edges left after filtering, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSet<'a> {
    pub nodes: Vec<ProjectedNode<'a>>,
    pub edges: Vec<ExecutionEdge>,
}

impl<'a> VisibleSet<'a> {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|p| p.id() == id)
    }

    pub fn node(&self, id: &str) -> Option<&ProjectedNode<'a>> {
        self.nodes.iter().find(|p| p.id() == id)
    }
}

/// Keeps nodes accepted by `filter` and edges whose both endpoints are kept.
pub fn filter_visible<'a>(
    nodes: &[ProjectedNode<'a>],
    edges: &[ExecutionEdge],
    filter: &FilterState,
) -> VisibleSet<'a> {
    let nodes: Vec<_> = nodes
        .iter()
        .filter(|p| filter.accepts(p.node))
        .copied()
        .collect();

    let ids: HashSet<&str> = nodes.iter().map(|p| p.node.id()).collect();
    let edges = edges
        .iter()
        .filter(|e| ids.contains(e.from.as_str()) && ids.contains(e.to.as_str()))
        .cloned()
        .collect();

    VisibleSet { nodes, edges }
}
