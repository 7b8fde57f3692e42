use std::collections::BTreeMap;

use crate::ir::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Side of the target node an edge arrives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrow {
    Down,
    Left,
    Up,
    Right,
    #[default]
    None,
}

impl Arrow {
    pub fn as_str(self) -> &'static str {
        match self {
            Arrow::Down => "down",
            Arrow::Left => "left",
            Arrow::Up => "up",
            Arrow::Right => "right",
            Arrow::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    pub id: NodeId,
    /// Top-left corner.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl NodeLayout {
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the open interiors of two boxes intersect. Touching borders do
    /// not count.
    pub fn overlaps(&self, other: &NodeLayout) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLayout {
    pub from: NodeId,
    pub to: NodeId,
    /// Position of the edge in the source node's edge list.
    pub index: usize,
    /// Orthogonal polyline from the source border to the target border.
    /// Empty when the edge could not be routed.
    pub points: Vec<Point>,
    pub arrow: Arrow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub nodes: BTreeMap<NodeId, NodeLayout>,
    /// Ordered by source id, then by position in the source's edge list.
    pub edges: Vec<EdgeLayout>,
    pub width: i32,
    pub height: i32,
}
