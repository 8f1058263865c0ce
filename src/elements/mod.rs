mod edge;
mod node;

pub use self::edge::ExecutionEdge;
pub use self::node::{ExecutionNode, NodeMetrics, NodeType, Status, NODE_SIZE};
