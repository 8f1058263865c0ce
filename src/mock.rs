//! Fixed sample data: the sentiment analysis session and a simulated system
//! health feed.

use egui::Pos2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::GraphError, ExecutionGraph, ExecutionNode, NodeMetrics, NodeType};

/// A recorded session that can be picked in the session selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: &'static str,
    pub name: &'static str,
}

pub const SESSIONS: [SessionInfo; 3] = [
    SessionInfo {
        id: "session-1",
        name: "Customer Sentiment Analysis",
    },
    SessionInfo {
        id: "session-2",
        name: "Product Recommendation",
    },
    SessionInfo {
        id: "session-3",
        name: "Content Generation",
    },
];

/// The six stages of the customer sentiment analysis run.
pub fn sentiment_analysis_nodes() -> Vec<ExecutionNode> {
    vec![
        ExecutionNode::new("start", NodeType::Prompt, 0)
            .with_title("Initial Prompt")
            .with_content(
                "Analyze the following customer feedback and provide sentiment analysis with key insights.",
            )
            .with_location(Pos2::new(100., 200.))
            .with_metrics(NodeMetrics::new(45, 28, 0.95))
            .with_connections(["llm-1"])
            .with_started_at_offset_ms(0),
        ExecutionNode::new("llm-1", NodeType::Model, 1)
            .with_title("GPT-4 Processing")
            .with_content(
                "Processing sentiment analysis...\n\n\
                 Based on the customer feedback, I can identify several key sentiment indicators:\n\n\
                 1. Overall Sentiment: Positive (0.78/1.0)\n\
                 2. Key Themes: Product satisfaction, delivery experience\n\
                 3. Emotional Indicators: \"love\", \"excellent\", \"disappointed\" (mixed)",
            )
            .with_location(Pos2::new(350., 200.))
            .with_metrics(NodeMetrics::new(1250, 156, 0.89))
            .with_connections(["tool-1", "memory-1"])
            .with_started_at_offset_ms(2000),
        ExecutionNode::new("tool-1", NodeType::Tool, 2)
            .with_title("Sentiment API Call")
            .with_content(
                "POST /api/sentiment/analyze\n{\n  \"text\": \"customer feedback\",\n  \
                 \"model\": \"advanced-sentiment-v2\",\n  \"confidence_threshold\": 0.7\n}",
            )
            .with_location(Pos2::new(600., 150.))
            .with_metrics(NodeMetrics::new(320, 0, 0.92))
            .with_connections(["llm-2"])
            .with_started_at_offset_ms(3000),
        ExecutionNode::new("memory-1", NodeType::Memory, 3)
            .with_title("Context Storage")
            .with_content(
                "Storing conversation context:\n- User intent: sentiment analysis\n\
                 - Previous interactions: 3\n- Session variables: customer_id, feedback_type\n\
                 - Confidence scores: sentiment=0.78, relevance=0.85",
            )
            .with_location(Pos2::new(600., 250.))
            .with_metrics(NodeMetrics::new(15, 0, 1.0))
            .with_connections(["llm-2"])
            .with_started_at_offset_ms(3200),
        ExecutionNode::new("llm-2", NodeType::Model, 4)
            .with_title("Response Generation")
            .with_content(
                "Final analysis complete:\n\nSentiment Summary:\n- Overall: Positive (78%)\n\
                 - Satisfaction: High\n- Concerns: Minor delivery delays\n\
                 - Recommendation: Follow up on logistics",
            )
            .with_location(Pos2::new(850., 200.))
            .with_metrics(NodeMetrics::new(890, 89, 0.91))
            .with_connections(["output"])
            .with_started_at_offset_ms(4500),
        ExecutionNode::new("output", NodeType::Output, 5)
            .with_title("Final Output")
            .with_content("Sentiment analysis completed successfully with high confidence score.")
            .with_location(Pos2::new(1100., 200.))
            .with_metrics(NodeMetrics::new(0, 89, 0.91))
            .with_started_at_offset_ms(5000),
    ]
}

/// # Errors
///
/// Never fails for the built-in data; the result mirrors [`ExecutionGraph::new`].
pub fn sentiment_analysis_graph() -> Result<ExecutionGraph, GraphError> {
    ExecutionGraph::new(sentiment_analysis_nodes())
}

/// Simulated backend health figures shown in the header.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub active_connections: u32,
    /// Seconds.
    pub avg_response_time: f32,
    /// Fraction in `0..=1`.
    pub error_rate: f32,
    /// Requests per minute.
    pub throughput: u32,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            active_connections: 247,
            avg_response_time: 1.2,
            error_rate: 0.03,
            throughput: 1847,
        }
    }
}

impl SystemMetrics {
    /// Refresh period of the simulated feed, in milliseconds.
    pub const REFRESH_MS: u64 = 3000;

    /// Applies one random-walk step to every figure.
    pub fn drift(&mut self, rng: &mut impl Rng) {
        self.active_connections = self
            .active_connections
            .saturating_add_signed(rng.random_range(-5..5));
        self.avg_response_time =
            (self.avg_response_time + rng.random_range(-0.1..0.1)).max(0.1);
        self.error_rate = (self.error_rate + rng.random_range(-0.005..0.005)).clamp(0., 1.);
        self.throughput = self.throughput.saturating_add_signed(rng.random_range(-50..50));
    }

    pub fn error_rate_percent(&self) -> f32 {
        self.error_rate * 100.
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::projection::project_edges;

    #[test]
    fn test_sample_graph_is_valid() {
        let g = sentiment_analysis_graph().unwrap();
        assert_eq!(g.total_steps(), 6);
        assert_eq!(g.node_by_ordinal(0).unwrap().id(), "start");
        assert_eq!(g.node_by_ordinal(5).unwrap().id(), "output");
    }

    #[test]
    fn test_sample_edges_at_memory_step() {
        let g = sentiment_analysis_graph().unwrap();
        let edges = project_edges(&g, 3);
        assert_eq!(edges.len(), 5);
        assert_eq!(edges.iter().filter(|e| e.animated).count(), 1);
        assert!(edges.iter().any(|e| e.from == "memory-1" && e.animated));
    }

    #[test]
    fn test_metrics_drift_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = SystemMetrics::default();
        for _ in 0..1000 {
            m.drift(&mut rng);
            assert!(m.avg_response_time >= 0.1);
            assert!((0. ..=1.).contains(&m.error_rate));
        }
    }

    #[test]
    fn test_session_ids_are_unique() {
        for (i, a) in SESSIONS.iter().enumerate() {
            assert!(SESSIONS[i + 1..].iter().all(|b| b.id != a.id));
        }
    }
}
