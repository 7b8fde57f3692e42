use crate::ir::{Graph, NodeId};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed graph document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Node {0} is defined more than once")]
    DuplicateNode(NodeId),
    #[error("Edge {from} -> {to} points to an unknown node")]
    UnknownTarget { from: NodeId, to: NodeId },
    #[error("Node {id} has a negative size ({width}x{height})")]
    NegativeSize { id: NodeId, width: i32, height: i32 },
}

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub graph: Graph,
    /// Entry requested by the document, if any.
    pub entry: Option<NodeId>,
}

impl ParseOutput {
    /// The requested entry, or the smallest node id.
    pub fn entry_or_first(&self) -> Option<NodeId> {
        self.entry
            .or_else(|| self.graph.nodes.keys().next().copied())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphDocument {
    #[serde(default)]
    entry: Option<NodeId>,
    #[serde(default)]
    nodes: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDocument {
    id: NodeId,
    #[serde(default)]
    width: i32,
    #[serde(default)]
    height: i32,
    #[serde(default)]
    edges: Vec<EdgeDocument>,
}

/// An edge is either a bare target id or `{"target": id}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EdgeDocument {
    Target(NodeId),
    Object { target: NodeId },
}

impl EdgeDocument {
    fn target(&self) -> NodeId {
        match self {
            EdgeDocument::Target(target) | EdgeDocument::Object { target } => *target,
        }
    }
}

/// Parse a graph document:
///
/// ```json
/// {"entry": 1, "nodes": [{"id": 1, "width": 120, "height": 40, "edges": [2, 3]}]}
/// ```
///
/// Edge order inside a node is kept, since it drives placement.
pub fn parse_graph(input: &str) -> Result<ParseOutput, ParseError> {
    let document: GraphDocument = serde_json::from_str(input)?;

    let mut graph = Graph::new();
    for node in &document.nodes {
        if graph.contains(node.id) {
            return Err(ParseError::DuplicateNode(node.id));
        }
        if node.width < 0 || node.height < 0 {
            return Err(ParseError::NegativeSize {
                id: node.id,
                width: node.width,
                height: node.height,
            });
        }
        graph.add_node(node.id, node.width, node.height);
    }

    for node in &document.nodes {
        for edge in &node.edges {
            let target = edge.target();
            if !graph.contains(target) {
                return Err(ParseError::UnknownTarget {
                    from: node.id,
                    to: target,
                });
            }
            graph.add_edge(node.id, target);
        }
    }

    Ok(ParseOutput {
        graph,
        entry: document.entry,
    })
}
