use std::collections::BTreeMap;

use tracing::debug;

use super::types::{Arrow, EdgeLayout, Layout, NodeLayout, Point};
use super::LayoutState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct NodeBox {
    pub(super) x: i32,
    pub(super) y: i32,
    pub(super) width: i32,
    pub(super) height: i32,
}

impl NodeBox {
    pub(super) fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub(super) fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }
}

/// Pixel coordinates of one routed edge: one value per segment, x for the
/// vertical segments (even indices) and y for the horizontal ones. Always
/// starts and ends with a vertical segment; empty when the edge is not drawn.
#[derive(Debug, Clone, Default)]
pub(super) struct DrawnEdge {
    pub(super) from: usize,
    pub(super) to: Option<usize>,
    pub(super) segments: Vec<i32>,
}

impl DrawnEdge {
    /// y range covered by vertical segment `idx`.
    pub(super) fn vertical_extent(&self, idx: usize, nodes: &[NodeBox]) -> Option<(i32, i32)> {
        let to = self.to?;
        let start = if idx == 0 {
            nodes[self.from].bottom()
        } else {
            self.segments[idx - 1]
        };
        let end = if idx + 1 == self.segments.len() {
            nodes[to].y
        } else {
            self.segments[idx + 1]
        };
        Some((start, end))
    }

    pub(super) fn polyline(&self, nodes: &[NodeBox]) -> Vec<Point> {
        let (Some(to), Some(&first), Some(&last)) =
            (self.to, self.segments.first(), self.segments.last())
        else {
            return Vec::new();
        };
        let mut points = Vec::with_capacity(self.segments.len() + 1);
        points.push(Point::new(first, nodes[self.from].bottom()));
        for idx in 1..self.segments.len() {
            let point = if idx % 2 == 1 {
                Point::new(self.segments[idx - 1], self.segments[idx])
            } else {
                Point::new(self.segments[idx], self.segments[idx - 1])
            };
            points.push(point);
        }
        points.push(Point::new(last, nodes[to].y));
        points
    }
}

/// The drawing in pixels, indexed like the layout state.
#[derive(Debug, Clone)]
pub(super) struct Drawing {
    pub(super) nodes: Vec<NodeBox>,
    pub(super) edges: Vec<DrawnEdge>,
    pub(super) width: i32,
    pub(super) height: i32,
}

/// Running sums over alternating gutter/cell sizes. Returns the start of every
/// gutter and the total length.
fn gutter_offsets(gutters: &[i32], cells: &[i32]) -> (Vec<i32>, i32) {
    let mut starts = Vec::with_capacity(gutters.len());
    let mut position = 0i32;
    for (idx, gutter) in gutters.iter().enumerate() {
        starts.push(position);
        position = position.saturating_add(*gutter);
        if let Some(cell) = cells.get(idx) {
            position = position.saturating_add(*cell);
        }
    }
    (starts, position)
}

/// Turn grid positions and segment offsets into pixels.
///
/// A node column is as wide as the widest half node reaching into it; a node
/// row as tall as its tallest node. Nodes are centred on their centre edge
/// column and top-aligned in their row.
pub(super) fn convert_to_pixels(state: &LayoutState) -> Drawing {
    let columns = state.columns as usize;
    let rows = state.rows as usize;

    let mut column_width = vec![0i32; columns];
    let mut row_height = vec![0i32; rows];
    for node in &state.nodes {
        let col = node.col as usize;
        let left_half = node.width / 2;
        column_width[col] = column_width[col].max(left_half);
        column_width[col + 1] = column_width[col + 1].max(node.width - left_half);
        let row = node.row as usize;
        row_height[row] = row_height[row].max(node.height);
    }

    let (edge_col_x, width) = gutter_offsets(&state.edge_column_width, &column_width);
    let (gap_row_y, height) = gutter_offsets(&state.edge_row_height, &row_height);

    let nodes: Vec<NodeBox> = state
        .nodes
        .iter()
        .map(|node| {
            let centre_col = node.col as usize + 1;
            let centre =
                edge_col_x[centre_col].saturating_add(state.edge_column_width[centre_col] / 2);
            let row = node.row as usize;
            NodeBox {
                x: centre.saturating_sub(node.width / 2),
                y: gap_row_y[row].saturating_add(state.edge_row_height[row]),
                width: node.width,
                height: node.height,
            }
        })
        .collect();

    let edges: Vec<DrawnEdge> = state
        .edges
        .iter()
        .map(|edge| {
            let segments = edge
                .points
                .iter()
                .enumerate()
                .filter_map(|(idx, point)| {
                    let base = if idx % 2 == 0 {
                        edge_col_x.get(point.col as usize)
                    } else {
                        gap_row_y.get(point.row as usize)
                    };
                    debug_assert!(base.is_some(), "waypoint outside the grid");
                    base.map(|base| base.saturating_add(point.offset))
                })
                .collect::<Vec<_>>();
            // a partially mapped route is not drawn at all
            let complete = edge.to.is_some() && segments.len() == edge.points.len();
            DrawnEdge {
                from: edge.from,
                to: edge.to,
                segments: if complete { segments } else { Vec::new() },
            }
        })
        .collect();

    debug!(width, height, "pixel coordinates computed");
    Drawing {
        nodes,
        edges,
        width,
        height,
    }
}

impl Drawing {
    /// Move the content so that its bounding box starts at `margin` and
    /// shrink the drawing to the box plus `margin` on every side.
    pub(super) fn crop(&mut self, margin: i32) {
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for node in &self.nodes {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.right());
            max_y = max_y.max(node.bottom());
        }
        for edge in &self.edges {
            for (idx, value) in edge.segments.iter().enumerate() {
                if idx % 2 == 0 {
                    min_x = min_x.min(*value);
                    max_x = max_x.max(*value);
                } else {
                    min_y = min_y.min(*value);
                    max_y = max_y.max(*value);
                }
            }
        }
        if min_x > max_x || min_y > max_y {
            return;
        }

        let dx = margin.saturating_sub(min_x);
        let dy = margin.saturating_sub(min_y);
        for node in &mut self.nodes {
            node.x = node.x.saturating_add(dx);
            node.y = node.y.saturating_add(dy);
        }
        for edge in &mut self.edges {
            for (idx, value) in edge.segments.iter_mut().enumerate() {
                let delta = if idx % 2 == 0 { dx } else { dy };
                *value = value.saturating_add(delta);
            }
        }
        self.width = max_x
            .saturating_sub(min_x)
            .saturating_add(margin.saturating_mul(2));
        self.height = max_y
            .saturating_sub(min_y)
            .saturating_add(margin.saturating_mul(2));
    }

    pub(super) fn into_layout(self, state: &LayoutState) -> Layout {
        let mut nodes = BTreeMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let id = state.nodes[idx].id;
            nodes.insert(
                id,
                NodeLayout {
                    id,
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                },
            );
        }

        let edges = self
            .edges
            .iter()
            .zip(&state.edges)
            .map(|(drawn, edge)| {
                let points = drawn.polyline(&self.nodes);
                let arrow = if points.is_empty() {
                    Arrow::None
                } else {
                    Arrow::Down
                };
                EdgeLayout {
                    from: state.nodes[edge.from].id,
                    to: edge.target,
                    index: edge.index,
                    points,
                    arrow,
                }
            })
            .collect();

        Layout {
            nodes,
            edges,
            width: self.width,
            height: self.height,
        }
    }
}
