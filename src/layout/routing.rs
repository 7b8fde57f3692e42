use tracing::debug;

use super::{LayoutState, Waypoint};
use crate::segment_tree::{PointMinTree, RangeAssignMaxTree, RangeMinMaxTree};

// ── Main column heuristics ──────────────────────────────────────────

/// An upward edge loops around the side of its source (instead of crossing
/// over to the nearest free column) when that costs at most this many extra
/// columns of horizontal travel.
const LOOP_COLUMN_SLACK: i32 = 2;

/// Added to the priority of upward edges so that, all else equal, downward
/// edges claim the inner offsets first.
const UPWARD_PRIORITY_PENALTY: i32 = 1;

/// Equally distant free columns on both sides: even edges of a node go left,
/// odd ones right, so sibling branches separate.
fn prefers_left(edge_index: usize) -> bool {
    edge_index % 2 == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    // edges are handled before the nodes of their own row are inserted
    Edge,
    Node,
}

/// Pick the edge column carrying the long vertical run of every edge.
///
/// Rows are swept top to bottom. A min tree over edge columns holds the last
/// row in which a node blocks each column, so "a column free between two
/// rows" is "a column whose value is below the top row", and the nearest one
/// on either side is a single tree search.
pub(super) fn select_main_columns(state: &mut LayoutState) {
    let mut events: Vec<(i32, EventKind, usize)> =
        Vec::with_capacity(state.nodes.len() + state.edges.len());
    for (idx, node) in state.nodes.iter().enumerate() {
        events.push((node.row, EventKind::Node, idx));
    }
    for (idx, edge) in state.edges.iter().enumerate() {
        let Some(to) = edge.to else {
            continue;
        };
        let row = (state.nodes[edge.from].row + 1).max(state.nodes[to].row);
        events.push((row, EventKind::Edge, idx));
    }
    events.sort_unstable();

    let mut blocked = PointMinTree::with_value(state.columns as usize + 1, -1);
    let mut side_columns = 0usize;
    for (_, kind, item) in events {
        if kind == EventKind::Node {
            let node = &state.nodes[item];
            blocked.set((node.col + 1) as usize, node.row);
            continue;
        }

        let edge = &state.edges[item];
        let Some(to) = edge.to else {
            continue;
        };
        let source = &state.nodes[edge.from];
        let target = &state.nodes[to];
        let top_row = (source.row + 1).min(target.row);
        let upward = target.row <= source.row;
        let source_col = source.col + 1;
        let target_col = target.col + 1;
        let is_free = |col: i32| blocked.get(col as usize) < top_row;

        let column = if is_free(source_col) {
            source_col
        } else if is_free(target_col) {
            target_col
        } else {
            side_columns += 1;
            let prefer_left = prefers_left(edge.index);
            nearest_free_column(&blocked, source_col, target_col, top_row, prefer_left, upward)
        };
        state.edges[item].main_column = column;
    }
    debug!(
        edges = state.edges.len(),
        side_columns, "main columns selected"
    );
}

fn nearest_free_column(
    blocked: &PointMinTree,
    source: i32,
    target: i32,
    top_row: i32,
    prefer_left: bool,
    upward: bool,
) -> i32 {
    let distance = |col: i32| (source - col).abs() + (target - col).abs();
    let (low, high) = (source.min(target), source.max(target));
    // the outermost edge columns never hold a node, so the left search
    // always finds something
    let left = blocked
        .rightmost_less_than(high as usize, top_row)
        .map(|col| col as i32);
    let right = blocked
        .leftmost_less_than(low as usize, top_row)
        .map(|col| col as i32);
    let mut best = match (left, right) {
        (Some(left), Some(right)) => {
            let (to_left, to_right) = (distance(left), distance(right));
            if to_left < to_right || (to_left == to_right && prefer_left) {
                left
            } else {
                right
            }
        }
        (Some(col), None) | (None, Some(col)) => col,
        (None, None) => 0,
    };

    if upward {
        let side = if target >= source { source + 1 } else { source - 1 };
        let free = side >= 0
            && (side as usize) < blocked.len()
            && blocked.get(side as usize) < top_row;
        if free && distance(side) <= distance(best) + LOOP_COLUMN_SLACK {
            best = side;
        }
    }
    best
}

// ── Rough routing ───────────────────────────────────────────────────

fn vertical(col: i32, end_row: i32) -> Waypoint {
    Waypoint {
        row: end_row,
        col,
        offset: 0,
        kind: 0,
    }
}

fn horizontal(gap_row: i32, end_col: i32) -> Waypoint {
    Waypoint {
        row: gap_row,
        col: end_col,
        offset: 0,
        kind: 0,
    }
}

/// Start and end of segment `idx` along its own axis, in doubled coordinates.
fn segment_span(points: &[Waypoint], idx: usize, source_row: i32) -> (i32, i32) {
    if idx % 2 == 0 {
        let start = if idx == 0 {
            2 * source_row + 1
        } else {
            2 * points[idx - 1].row
        };
        (start, points[idx].row)
    } else {
        (2 * points[idx - 1].col, points[idx].col)
    }
}

/// Expand every edge into at most five alternating segments: out of the
/// source, over to the main column, along it, over to the target column and
/// into the target. Vertical runs collapse when the main column is the
/// source's or the target's own column.
pub(super) fn route_edges(state: &mut LayoutState) {
    let mut routed = 0usize;
    for idx in 0..state.edges.len() {
        let edge = &state.edges[idx];
        let Some(to) = edge.to else {
            continue;
        };
        let source = &state.nodes[edge.from];
        let target = &state.nodes[to];
        let source_col = source.col + 1;
        let target_col = target.col + 1;
        let main = edge.main_column;
        let below_source = source.row + 1;
        let target_row = 2 * target.row + 1;

        let mut points = Vec::with_capacity(5);
        if main != source_col {
            points.push(vertical(source_col, 2 * below_source));
            points.push(horizontal(below_source, 2 * main));
        }
        if main == target_col {
            points.push(vertical(main, target_row));
        } else {
            points.push(vertical(main, 2 * target.row));
            points.push(horizontal(target.row, 2 * target_col));
            points.push(vertical(target_col, target_row));
        }

        let directions: Vec<i32> = (0..points.len())
            .map(|seg| {
                let (start, end) = segment_span(&points, seg, source.row);
                (end - start).signum()
            })
            .collect();
        let mut length = 0;
        for seg in 0..points.len() {
            let before = if seg == 0 { 0 } else { directions[seg - 1] };
            let after = directions.get(seg + 1).copied().unwrap_or(0);
            points[seg].kind = before + after;
            let (start, end) = segment_span(&points, seg, source.row);
            length += (end - start).abs();
        }

        let upward = target.row <= source.row;
        let priority = 2 * length + if upward { UPWARD_PRIORITY_PENALTY } else { 0 };
        let edge = &mut state.edges[idx];
        edge.points = points;
        edge.priority = priority;
        routed += 1;
    }
    debug!(routed, "edges roughly routed");
}

// ── Offset assignment ───────────────────────────────────────────────

/// A segment inside its lane (edge column or gap row), as seen by the offset
/// sweep.
#[derive(Debug, Clone, Copy)]
struct LaneSegment {
    lane: i32,
    /// Occupied closed range along the lane, doubled coordinates.
    low: i32,
    high: i32,
    kind: i32,
    length: i32,
    priority: i32,
    edge: usize,
    point: usize,
    spacing: i32,
    offset: i32,
}

impl LaneSegment {
    fn sort_key(&self) -> (i32, i32, i32, i32, usize, usize) {
        // bending left/up: short ones inside; bending right/down: long ones inside
        let length = if self.kind <= 0 {
            self.length
        } else {
            -self.length
        };
        (
            self.lane,
            self.kind,
            length,
            self.priority,
            self.edge,
            self.point,
        )
    }
}

/// Spacing between the stubs of a node: shrunk so that all of them still fit
/// under the node when there are many.
fn stub_spacing(width: i32, stubs: usize, spacing: i32) -> i32 {
    let stubs = i32::try_from(stubs).unwrap_or(i32::MAX);
    if stubs > 1 && stubs.saturating_mul(spacing) > width {
        (width / stubs).max(1).min(spacing)
    } else {
        spacing
    }
}

fn default_widths(lanes: usize, outer: i32, inner: i32) -> Vec<i32> {
    (0..lanes)
        .map(|lane| {
            if lane == 0 || lane + 1 == lanes {
                outer
            } else {
                inner
            }
        })
        .collect()
}

/// Give every segment an offset inside its lane so that segments sharing a
/// stretch of a lane never coincide, then reserve lane widths and centre the
/// independent groups of each lane.
pub(super) fn assign_offsets(state: &mut LayoutState) {
    let config = state.config;
    let edge_spacing_x = config.edge_horizontal_spacing;
    let edge_spacing_y = config.edge_vertical_spacing;

    let mut outgoing = vec![0usize; state.nodes.len()];
    for edge in &state.edges {
        if edge.to.is_some() {
            outgoing[edge.from] += 1;
        }
    }
    let incoming = state.incoming_counts();

    let mut vertical_segments = Vec::new();
    let mut horizontal_segments = Vec::new();
    for (edge_idx, edge) in state.edges.iter().enumerate() {
        let Some(to) = edge.to else {
            continue;
        };
        let source = &state.nodes[edge.from];
        let target = &state.nodes[to];
        let last = edge.points.len().saturating_sub(1);
        for (point_idx, point) in edge.points.iter().enumerate() {
            let (start, end) = segment_span(&edge.points, point_idx, source.row);
            let (mut low, mut high) = (start.min(end), start.max(end));
            let mut segment = LaneSegment {
                lane: 0,
                low,
                high,
                kind: point.kind,
                length: high - low,
                priority: edge.priority,
                edge: edge_idx,
                point: point_idx,
                spacing: edge_spacing_x,
                offset: 0,
            };
            if point_idx % 2 == 1 {
                segment.lane = point.row;
                segment.spacing = edge_spacing_y;
                horizontal_segments.push(segment);
                continue;
            }

            // a stub's end inside a node row belongs to the node
            if low % 2 == 1 {
                low += 1;
            }
            if high % 2 == 1 {
                high -= 1;
            }
            segment.lane = point.col;
            segment.low = low;
            segment.high = high.max(low);
            if point_idx == 0 {
                segment.spacing = segment.spacing.min(stub_spacing(
                    source.width,
                    outgoing[edge.from],
                    edge_spacing_x,
                ));
            }
            if point_idx == last {
                segment.spacing =
                    segment
                        .spacing
                        .min(stub_spacing(target.width, incoming[to], edge_spacing_x));
            }
            vertical_segments.push(segment);
        }
    }

    let columns = state.columns as usize + 1;
    let rows = state.rows as usize + 1;
    state.edge_column_width = assign_lane_offsets(
        &mut vertical_segments,
        2 * rows - 1,
        edge_spacing_x,
        default_widths(columns, edge_spacing_x, config.block_horizontal_spacing),
    );
    state.edge_row_height = assign_lane_offsets(
        &mut horizontal_segments,
        2 * columns - 1,
        edge_spacing_y,
        default_widths(rows, edge_spacing_y, config.block_vertical_spacing),
    );

    for segment in vertical_segments.iter().chain(&horizontal_segments) {
        state.edges[segment.edge].points[segment.point].offset = segment.offset;
    }
    debug!(
        vertical = vertical_segments.len(),
        horizontal = horizontal_segments.len(),
        "segment offsets assigned"
    );
}

/// Greedy sweep over one orientation. Returns the reserved width of every
/// lane.
fn assign_lane_offsets(
    segments: &mut [LaneSegment],
    extent: usize,
    spacing: i32,
    mut widths: Vec<i32>,
) -> Vec<i32> {
    segments.sort_by_key(LaneSegment::sort_key);

    // highest offset claimed so far along the current lane
    let mut claimed = RangeAssignMaxTree::with_value(extent, 0);
    for lane in segments.chunk_by_mut(|a, b| a.lane == b.lane) {
        let mut max_offset = 0;
        for segment in lane.iter_mut() {
            let (low, high) = (segment.low as usize, segment.high as usize + 1);
            let offset = claimed.range_max(low, high).saturating_add(segment.spacing);
            claimed.set_range(low, high, offset);
            segment.offset = offset;
            max_offset = max_offset.max(offset);
        }
        for segment in lane.iter() {
            claimed.set_range(segment.low as usize, segment.high as usize + 1, 0);
        }

        let Some(width) = widths.get_mut(lane[0].lane as usize) else {
            continue;
        };
        *width = (*width).max(max_offset.saturating_add(spacing));
        center_groups(lane, *width);
    }
    widths
}

/// Shift each maximal group of transitively overlapping segments of a lane so
/// that the group sits in the middle of the lane.
fn center_groups(lane: &mut [LaneSegment], width: i32) {
    let Some(start) = lane.iter().map(|segment| segment.low).min() else {
        return;
    };
    let end = lane.iter().map(|segment| segment.high).max().unwrap_or(start);
    let mut extents = RangeMinMaxTree::new((end - start + 1) as usize);
    for segment in lane.iter() {
        extents.widen_range(
            (segment.low - start) as usize,
            (segment.high - start + 1) as usize,
            segment.offset,
        );
    }

    lane.sort_by_key(|segment| (segment.low, segment.high, segment.offset));
    let mut group_start = 0;
    while group_start < lane.len() {
        let mut group_end = group_start + 1;
        let mut reach = lane[group_start].high;
        while group_end < lane.len() && lane[group_end].low <= reach {
            reach = reach.max(lane[group_end].high);
            group_end += 1;
        }

        let span = extents.range_min_max(
            (lane[group_start].low - start) as usize,
            (reach - start + 1) as usize,
        );
        let shift = (width - span.min - span.max).div_euclid(2);
        for segment in &mut lane[group_start..group_end] {
            segment.offset += shift;
        }
        group_start = group_end;
    }
}
