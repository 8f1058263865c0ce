//! Pure derivations of display state from the playback step.
//!
//! Every function here is deterministic in its inputs, so re-projecting after a
//! seek yields exactly what stepping there would have.

use std::cmp::Ordering;

use crate::{ExecutionEdge, ExecutionGraph, ExecutionNode, NodeType, Status};

/// A node paired with its status at some step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedNode<'a> {
    pub node: &'a ExecutionNode,
    pub status: Status,
}

impl ProjectedNode<'_> {
    pub fn id(&self) -> &str {
        self.node.id()
    }
}

/// Status of `node` when playback is at `current_step`.
pub fn project_status(node: &ExecutionNode, current_step: usize) -> Status {
    if let Some(status) = node.status_override() {
        return status;
    }

    match node.ordinal().cmp(&current_step) {
        Ordering::Less => Status::Completed,
        Ordering::Equal => Status::Processing,
        Ordering::Greater => Status::Pending,
    }
}

/// Projects every node of the graph, in execution order.
pub fn project_nodes(graph: &ExecutionGraph, current_step: usize) -> Vec<ProjectedNode<'_>> {
    graph
        .nodes()
        .map(|node| ProjectedNode {
            node,
            status: project_status(node, current_step),
        })
        .collect()
}

/// Edges present at `current_step`: outgoing connections of nodes that are
/// processing or completed. Edges leaving a processing node are animated.
pub fn project_edges(graph: &ExecutionGraph, current_step: usize) -> Vec<ExecutionEdge> {
    project_nodes(graph, current_step)
        .iter()
        .filter(|p| p.status.emits_edges())
        .flat_map(|p| {
            let animated = p.status == Status::Processing;
            p.node
                .connections()
                .iter()
                .filter(|to| graph.contains(to.as_str()))
                .map(move |to| ExecutionEdge::new(p.node.id(), to.as_str(), animated))
        })
        .collect()
}

/// One row of the execution timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    pub id: String,
    pub title: String,
    pub node_type: NodeType,
    pub status: Status,
    pub started_at_offset_ms: u64,
    pub duration_ms: u32,
}

/// Timeline rows in execution order, with status at `current_step`.
pub fn project_timeline(graph: &ExecutionGraph, current_step: usize) -> Vec<TimelineEntry> {
    project_nodes(graph, current_step)
        .into_iter()
        .map(|p| TimelineEntry {
            id: p.node.id().to_string(),
            title: p.node.title().to_string(),
            node_type: p.node.node_type(),
            status: p.status,
            started_at_offset_ms: p.node.started_at_offset_ms(),
            duration_ms: p.node.metrics().latency_ms,
        })
        .collect()
}

/// Share of the session reached at `current_step`, in percent.
pub fn progress(current_step: usize, total_steps: usize) -> f32 {
    if total_steps == 0 {
        return 0.;
    }
    ((current_step + 1) as f32 / total_steps as f32 * 100.).min(100.)
}

/// Human readable stage duration: `45ms`, `1.3s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1000.)
    }
}

/// Truncates `content` to `max_chars` characters, marking the cut with `...`.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> ExecutionGraph {
        let nodes = (0..len)
            .map(|i| {
                let next = (i + 1 < len).then(|| format!("n{}", i + 1));
                ExecutionNode::new(format!("n{i}"), NodeType::Model, i).with_connections(next)
            })
            .collect();
        ExecutionGraph::new(nodes).unwrap()
    }

    #[test]
    fn test_status_from_ordinal() {
        let n = ExecutionNode::new("n", NodeType::Tool, 2);
        assert_eq!(project_status(&n, 0), Status::Pending);
        assert_eq!(project_status(&n, 2), Status::Processing);
        assert_eq!(project_status(&n, 5), Status::Completed);
    }

    #[test]
    fn test_status_is_exclusive_at_every_step() {
        let g = chain(6);
        for step in 0..6 {
            for p in project_nodes(&g, step) {
                let expected = match p.node.ordinal().cmp(&step) {
                    Ordering::Less => Status::Completed,
                    Ordering::Equal => Status::Processing,
                    Ordering::Greater => Status::Pending,
                };
                assert_eq!(p.status, expected);
                assert_eq!(p.status == Status::Processing, p.node.ordinal() == step);
                assert_eq!(project_status(p.node, step), p.status);
            }
        }
    }

    #[test]
    fn test_override_wins() {
        let n = ExecutionNode::new("n", NodeType::Error, 0).with_status_override(Status::Error);
        assert_eq!(project_status(&n, 0), Status::Error);
        assert_eq!(project_status(&n, 3), Status::Error);
    }

    #[test]
    fn test_edges_follow_running_and_finished_nodes() {
        let g = chain(4);

        let edges = project_edges(&g, 0);
        assert_eq!(edges, vec![ExecutionEdge::new("n0", "n1", true)]);

        let edges = project_edges(&g, 2);
        assert_eq!(
            edges,
            vec![
                ExecutionEdge::new("n0", "n1", false),
                ExecutionEdge::new("n1", "n2", false),
                ExecutionEdge::new("n2", "n3", true),
            ]
        );
    }

    #[test]
    fn test_edges_are_reprojected_identically() {
        let g = chain(5);
        assert_eq!(project_edges(&g, 3), project_edges(&g, 3));
    }

    #[test]
    fn test_timeline_rows() {
        let g = chain(3);
        let rows = project_timeline(&g, 1);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["n0", "n1", "n2"]);
        assert_eq!(rows[1].status, Status::Processing);
        assert_eq!(rows[2].status, Status::Pending);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(0, 4), 25.);
        assert_eq!(progress(3, 4), 100.);
        assert_eq!(progress(9, 4), 100.);
        assert_eq!(progress(0, 0), 0.);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0ms");
        assert_eq!(format_duration(320), "320ms");
        assert_eq!(format_duration(1340), "1.3s");
        assert_eq!(format_duration(2000), "2.0s");
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short", 100), "short");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("héllo", 2), "hé...");
    }
}
