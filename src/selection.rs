use log::debug;

use crate::{
    filter::VisibleSet,
    projection::{format_duration, project_status},
    ExecutionGraph, NodeMetrics, NodeType, Status,
};

/// Read-only view of the selected node for a details panel.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetail {
    pub id: String,
    pub node_type: NodeType,
    pub title: String,
    pub content: String,
    pub metrics: NodeMetrics,
    pub status: Status,
    pub started_at_offset_ms: u64,
    pub connections: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One line of a node's execution log, stamped relative to session start.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub offset_ms: u64,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub chars: usize,
    pub words: usize,
    pub lines: usize,
}

impl NodeDetail {
    /// Execution log implied by the node's status. Pending nodes have none.
    pub fn log(&self) -> Vec<LogEntry> {
        let start = self.started_at_offset_ms;
        let end = start + u64::from(self.metrics.latency_ms);
        let entry = |offset_ms, level, message: String| LogEntry {
            offset_ms,
            level,
            message,
        };

        let mut log = Vec::new();
        if self.status == Status::Pending {
            return log;
        }

        log.push(entry(start, LogLevel::Info, "Node execution started".into()));
        log.push(entry(start, LogLevel::Debug, "Input validation completed".into()));
        match self.status {
            Status::Completed => {
                log.push(entry(
                    end,
                    LogLevel::Info,
                    format!("Completed in {}", format_duration(self.metrics.latency_ms.into())),
                ));
                log.push(entry(
                    end,
                    LogLevel::Debug,
                    format!("Generated {} tokens", self.metrics.token_count),
                ));
                log.push(entry(
                    end,
                    LogLevel::Debug,
                    format!("Confidence score calculated: {:.2}", self.metrics.confidence),
                ));
            }
            Status::Error => log.push(entry(end, LogLevel::Error, "Execution failed".into())),
            Status::Processing | Status::Pending => {}
        }
        log
    }

    pub fn content_stats(&self) -> ContentStats {
        ContentStats {
            chars: self.content.chars().count(),
            words: self.content.split_whitespace().count(),
            lines: self.content.split('\n').count(),
        }
    }
}

/// Tracks at most one selected node.
///
/// A selected node is always visible: selecting a hidden node clears the
/// selection and [`Selection::reconcile`] drops a selection that a filter
/// change has hidden.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<String>,
}

impl Selection {
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Selects `id` if it is visible, otherwise clears the selection.
    /// Returns whether `id` ended up selected.
    pub fn select(&mut self, id: &str, visible: &VisibleSet<'_>) -> bool {
        if visible.contains(id) {
            self.selected = Some(id.to_string());
            true
        } else {
            debug!("refusing to select hidden node {id}");
            self.selected = None;
            false
        }
    }

    /// Clears the selection if its node is no longer visible.
    /// Returns the id that was dropped.
    pub fn reconcile(&mut self, visible: &VisibleSet<'_>) -> Option<String> {
        let stale = self
            .selected
            .as_deref()
            .is_some_and(|id| !visible.contains(id));
        if !stale {
            return None;
        }

        let dropped = self.selected.take();
        debug!("dropped stale selection {dropped:?}");
        dropped
    }

    /// Closes the details panel. Returns the id that was selected.
    pub fn close(&mut self) -> Option<String> {
        self.selected.take()
    }

    /// Details of the selected node at `current_step`.
    pub fn detail(&self, graph: &ExecutionGraph, current_step: usize) -> Option<NodeDetail> {
        let node = graph.node(self.selected.as_deref()?)?;
        Some(NodeDetail {
            id: node.id().to_string(),
            node_type: node.node_type(),
            title: node.title().to_string(),
            content: node.content().to_string(),
            metrics: node.metrics(),
            status: project_status(node, current_step),
            started_at_offset_ms: node.started_at_offset_ms(),
            connections: node.connections().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{filter_visible, FilterState},
        projection::project_nodes,
        ExecutionNode,
    };

    fn graph() -> ExecutionGraph {
        ExecutionGraph::new(vec![
            ExecutionNode::new("p", NodeType::Prompt, 0).with_title("Initial Prompt"),
            ExecutionNode::new("t", NodeType::Tool, 1).with_title("Sentiment API Call"),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_visible_node() {
        let g = graph();
        let nodes = project_nodes(&g, 0);
        let visible = filter_visible(&nodes, &[], &FilterState::default());

        let mut s = Selection::default();
        assert!(s.select("t", &visible));
        assert!(s.is_selected("t"));
        assert_eq!(s.selected(), Some("t"));
    }

    #[test]
    fn test_select_hidden_node_clears() {
        let g = graph();
        let nodes = project_nodes(&g, 0);
        let all = filter_visible(&nodes, &[], &FilterState::default());
        let mut filter = FilterState::default();
        filter.toggle(NodeType::Tool, false);
        let narrowed = filter_visible(&nodes, &[], &filter);

        let mut s = Selection::default();
        s.select("p", &all);
        assert!(!s.select("t", &narrowed));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn test_reconcile_drops_hidden_selection() {
        let g = graph();
        let nodes = project_nodes(&g, 0);
        let all = filter_visible(&nodes, &[], &FilterState::default());

        let mut s = Selection::default();
        s.select("t", &all);
        assert_eq!(s.reconcile(&all), None);

        let mut filter = FilterState::default();
        filter.toggle(NodeType::Tool, false);
        let narrowed = filter_visible(&nodes, &[], &filter);
        assert_eq!(s.reconcile(&narrowed), Some("t".to_string()));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn test_detail_follows_step() {
        let g = graph();
        let nodes = project_nodes(&g, 0);
        let all = filter_visible(&nodes, &[], &FilterState::default());

        let mut s = Selection::default();
        assert!(s.detail(&g, 0).is_none());

        s.select("t", &all);
        let d = s.detail(&g, 0).unwrap();
        assert_eq!(d.title, "Sentiment API Call");
        assert_eq!(d.status, Status::Pending);
        assert_eq!(s.detail(&g, 1).unwrap().status, Status::Processing);

        assert_eq!(s.close(), Some("t".to_string()));
        assert!(s.detail(&g, 1).is_none());
    }

    fn detail_at(status: Option<Status>, step: usize) -> NodeDetail {
        let mut node = ExecutionNode::new("m", NodeType::Model, 0)
            .with_content("Overall: Positive\nThemes: delivery")
            .with_metrics(NodeMetrics::new(1300, 156, 0.89))
            .with_started_at_offset_ms(2000)
            .with_connections(["t"]);
        if let Some(status) = status {
            node = node.with_status_override(status);
        }
        let g = ExecutionGraph::new(vec![
            node,
            ExecutionNode::new("t", NodeType::Tool, 1),
        ])
        .unwrap();
        let nodes = project_nodes(&g, step);
        let all = filter_visible(&nodes, &[], &FilterState::default());

        let mut s = Selection::default();
        s.select("m", &all);
        s.detail(&g, step).unwrap()
    }

    #[test]
    fn test_log_grows_with_status() {
        let processing = detail_at(None, 0);
        assert_eq!(processing.connections, vec!["t".to_string()]);
        let log = processing.log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.offset_ms == 2000));

        let completed = detail_at(None, 1).log();
        assert_eq!(completed.len(), 5);
        let last = &completed[4];
        assert_eq!(last.offset_ms, 3300);
        assert_eq!(last.level, LogLevel::Debug);
        assert_eq!(last.message, "Confidence score calculated: 0.89");
        assert_eq!(completed[2].message, "Completed in 1.3s");

        let failed = detail_at(Some(Status::Error), 1).log();
        assert_eq!(failed.last().map(|e| e.level), Some(LogLevel::Error));

        let pending = detail_at(Some(Status::Pending), 1);
        assert!(pending.log().is_empty());
    }

    #[test]
    fn test_content_stats() {
        let d = detail_at(None, 0);
        assert_eq!(
            d.content_stats(),
            ContentStats {
                chars: 34,
                words: 4,
                lines: 2,
            }
        );
    }
}
