use std::collections::HashMap;

use egui::{Pos2, Rect};
use petgraph::{
    algo::is_cyclic_directed,
    stable_graph::{NodeIndex, StableGraph},
};

use crate::{elements::NODE_SIZE, error::GraphError, ExecutionNode};

/// Wrapper around [`petgraph::stable_graph::StableGraph`] holding the fixed
/// execution sequence of one session.
///
/// Construction checks that ids are unique, ordinals are contiguous from 0,
/// connections point at known nodes and the graph is acyclic. Afterwards the
/// graph is immutable.
#[derive(Debug, Clone)]
pub struct ExecutionGraph {
    g: StableGraph<ExecutionNode, ()>,
    by_id: HashMap<String, NodeIndex>,
    /// Node indices sorted by ordinal.
    order: Vec<NodeIndex>,
}

impl ExecutionGraph {
    /// Builds the graph from node descriptions in any order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the nodes do not describe a valid execution sequence.
    pub fn new(nodes: Vec<ExecutionNode>) -> Result<Self, GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut g = StableGraph::with_capacity(nodes.len(), nodes.len());
        let mut by_id = HashMap::with_capacity(nodes.len());
        for n in nodes {
            let id = n.id().to_string();
            if by_id.contains_key(&id) {
                return Err(GraphError::DuplicateId(id));
            }
            let idx = g.add_node(n);
            by_id.insert(id, idx);
        }

        let mut order: Vec<NodeIndex> = g.node_indices().collect();
        order.sort_by_key(|idx| g[*idx].ordinal());
        for (expected, idx) in order.iter().enumerate() {
            let n = &g[*idx];
            if n.ordinal() != expected {
                return Err(GraphError::NonContiguousOrdinal {
                    id: n.id().to_string(),
                    ordinal: n.ordinal(),
                    expected,
                });
            }
        }

        for idx in &order {
            let from = &g[*idx];
            let mut targets = Vec::with_capacity(from.connections().len());
            for to in from.connections() {
                match by_id.get(to) {
                    Some(to_idx) => targets.push(*to_idx),
                    None => {
                        return Err(GraphError::UnknownConnection {
                            from: from.id().to_string(),
                            to: to.clone(),
                        })
                    }
                }
            }
            for to_idx in targets {
                g.add_edge(*idx, to_idx, ());
            }
        }

        if is_cyclic_directed(&g) {
            return Err(GraphError::Cycle);
        }

        Ok(Self { g, by_id, order })
    }

    pub fn node(&self, id: &str) -> Option<&ExecutionNode> {
        self.by_id.get(id).map(|idx| &self.g[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Iterates nodes in execution order.
    pub fn nodes(&self) -> impl Iterator<Item = &ExecutionNode> + '_ {
        self.order.iter().map(|idx| &self.g[*idx])
    }

    /// Node executed at playback step `ordinal`.
    pub fn node_by_ordinal(&self, ordinal: usize) -> Option<&ExecutionNode> {
        self.order.get(ordinal).map(|idx| &self.g[*idx])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of playback steps, one per node.
    pub fn total_steps(&self) -> usize {
        self.len()
    }

    /// Bounding rect of all node cards in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        let mut min = Pos2::new(f32::MAX, f32::MAX);
        let mut max = Pos2::new(f32::MIN, f32::MIN);
        for n in self.nodes() {
            let loc = n.location();
            min = min.min(loc);
            max = max.max(loc + NODE_SIZE);
        }
        Rect::from_min_max(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;

    fn node(id: &str, ordinal: usize, connections: &[&str]) -> ExecutionNode {
        ExecutionNode::new(id, NodeType::Model, ordinal).with_connections(connections.iter().copied())
    }

    #[test]
    fn test_nodes_are_ordered_by_ordinal() {
        let g = ExecutionGraph::new(vec![
            node("c", 2, &[]),
            node("a", 0, &["b"]),
            node("b", 1, &["c"]),
        ])
        .unwrap();

        let ids: Vec<_> = g.nodes().map(ExecutionNode::id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(g.total_steps(), 3);
        assert_eq!(g.node("b").unwrap().connections(), ["c".to_string()]);
        assert_eq!(g.node_by_ordinal(1).unwrap().id(), "b");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(ExecutionGraph::new(vec![]).unwrap_err(), GraphError::Empty);
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = ExecutionGraph::new(vec![node("a", 0, &[]), node("a", 1, &[])]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_rejects_gap_in_ordinals() {
        let err = ExecutionGraph::new(vec![node("a", 0, &[]), node("b", 2, &[])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::NonContiguousOrdinal {
                id: "b".to_string(),
                ordinal: 2,
                expected: 1,
            }
        );
    }

    #[test]
    fn test_rejects_unknown_connection() {
        let err = ExecutionGraph::new(vec![node("a", 0, &["ghost"])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownConnection {
                from: "a".to_string(),
                to: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_cycle() {
        let err =
            ExecutionGraph::new(vec![node("a", 0, &["b"]), node("b", 1, &["a"])]).unwrap_err();
        assert_eq!(err, GraphError::Cycle);
    }

    #[test]
    fn test_bounds_cover_cards() {
        let g = ExecutionGraph::new(vec![
            node("a", 0, &[]).with_location(Pos2::new(100., 200.)),
            node("b", 1, &[]).with_location(Pos2::new(600., 150.)),
        ])
        .unwrap();

        let b = g.bounds();
        assert_eq!(b.min, Pos2::new(100., 150.));
        assert_eq!(b.max, Pos2::new(600. + NODE_SIZE.x, 200. + NODE_SIZE.y));
    }
}
