use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque node identifier. Ordered so that every id-keyed walk is
/// deterministic.
pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    #[default]
    TopDown,
    LeftRight,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" | "topDown" | "top-down" => Some(Self::TopDown),
            "LR" | "leftRight" | "left-right" => Some(Self::LeftRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub width: i32,
    pub height: i32,
    /// Outgoing edges in caller order. The order is significant: it drives
    /// sibling placement and routing tie-breaks.
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: BTreeMap<NodeId, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Insert a node, or resize it if it already exists (its edges are kept).
    pub fn add_node(&mut self, id: NodeId, width: i32, height: i32) {
        let entry = self.nodes.entry(id).or_insert(Node {
            width,
            height,
            edges: Vec::new(),
        });
        entry.width = width;
        entry.height = height;
    }

    /// Append an edge to `from`'s edge list. Returns `false` when `from` is
    /// not in the graph. `to` is not checked: dangling targets are tolerated
    /// by the layout and reported there.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.nodes.get_mut(&from) {
            Some(node) => {
                node.edges.push(Edge { target: to });
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.edges.len()).sum()
    }
}
