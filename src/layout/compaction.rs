//! Pull the pixel drawing together without changing its topology.
//!
//! Two independent passes, vertical first. Each pass turns the positions on
//! its axis into a [`LinearProgram`]: every node and every segment running
//! across the axis is a variable, the relative order of everything that
//! overlaps on the other axis is kept with a sweep over a skyline, and the
//! objective is the total length of the segments running along the axis.

use std::collections::BTreeMap;

use tracing::debug;

use super::coords::{Drawing, DrawnEdge, NodeBox};
use super::lp::{LinearProgram, SolveStats};
use super::LayoutState;

/// A position on the compacted axis: a variable plus a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    var: usize,
    offset: i32,
}

impl Anchor {
    fn new(var: usize, offset: i32) -> Self {
        Self { var, offset }
    }

    fn value(&self, lp: &LinearProgram) -> i32 {
        lp.value(self.var).saturating_add(self.offset)
    }
}

/// Something that must keep its order on the compacted axis relative to
/// anything it overlaps on the other axis.
#[derive(Debug, Clone, Copy)]
struct Obstacle {
    /// Closed pixel range on the other axis.
    lo: i32,
    hi: i32,
    near: Anchor,
    far: Anchor,
    is_node: bool,
}

#[derive(Debug, Clone, Copy)]
struct Spacing {
    block: i32,
    edge: i32,
}

pub(super) fn compact(drawing: &mut Drawing, state: &LayoutState) {
    let config = state.config;
    let passes = config.compaction_passes as usize;
    let vertical = compact_vertical(
        drawing,
        Spacing {
            block: config.block_vertical_spacing,
            edge: config.edge_vertical_spacing,
        },
        passes,
    );
    let horizontal = compact_horizontal(
        drawing,
        state,
        Spacing {
            block: config.block_horizontal_spacing,
            edge: config.edge_horizontal_spacing,
        },
        passes,
    );
    debug!(
        vertical_moves = vertical.moves,
        vertical_fusions = vertical.fusions,
        horizontal_moves = horizontal.moves,
        horizontal_fusions = horizontal.fusions,
        "compaction finished"
    );
}

/// Require `upper` to stay at least `min(spacing, current distance)` past
/// `lower`. Pairs that already overlap are left unconstrained.
fn keep_order(lp: &mut LinearProgram, lower: Anchor, upper: Anchor, spacing: i32) {
    if lower.var == upper.var {
        return;
    }
    let current = upper.value(lp).saturating_sub(lower.value(lp));
    if current < 0 {
        return;
    }
    let gap = lower
        .offset
        .saturating_sub(upper.offset)
        .saturating_add(spacing.min(current));
    lp.add_min_distance(lower.var, upper.var, gap);
}

/// Order both anchors of a segment by their current value.
fn ordered(lp: &LinearProgram, a: Anchor, b: Anchor) -> (Anchor, Anchor) {
    if b.value(lp) >= a.value(lp) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Keep a segment's direction and charge its length to the objective.
fn add_segment_length(lp: &mut LinearProgram, a: Anchor, b: Anchor, spacing: i32) {
    if a.var == b.var {
        return;
    }
    let (low, high) = ordered(lp, a, b);
    keep_order(lp, low, high, spacing);
    lp.add_cost(high.var, 1);
    lp.add_cost(low.var, -1);
}

/// Sweep obstacles in order of their near side. The skyline maps the start of
/// each disjoint range on the other axis to its end and the obstacle last
/// seen there; every new obstacle is ordered after the ones it covers.
fn sweep(lp: &mut LinearProgram, obstacles: &[Obstacle], spacing: Spacing) {
    let mut order: Vec<usize> = (0..obstacles.len())
        .filter(|idx| obstacles[*idx].lo <= obstacles[*idx].hi)
        .collect();
    order.sort_by_key(|idx| (obstacles[*idx].near.value(lp), *idx));

    let mut skyline: BTreeMap<i32, (i32, usize)> = BTreeMap::new();
    let mut covered: Vec<(i32, i32, usize)> = Vec::new();
    for idx in order {
        let obstacle = obstacles[idx];
        covered.clear();
        for (start, (end, owner)) in skyline.range(..=obstacle.hi).rev() {
            if *end < obstacle.lo {
                break;
            }
            covered.push((*start, *end, *owner));
        }

        let mut owners: Vec<usize> = covered.iter().map(|(_, _, owner)| *owner).collect();
        owners.sort_unstable();
        owners.dedup();
        for owner in owners {
            let below = obstacles[owner];
            let gap = if below.is_node && obstacle.is_node {
                spacing.block
            } else {
                spacing.edge
            };
            keep_order(lp, below.far, obstacle.near, gap);
        }

        for (start, end, owner) in covered.iter().copied() {
            skyline.remove(&start);
            if start < obstacle.lo {
                skyline.insert(start, (obstacle.lo - 1, owner));
            }
            if end > obstacle.hi {
                skyline.insert(obstacle.hi + 1, (end, owner));
            }
        }
        skyline.insert(obstacle.lo, (obstacle.hi, idx));
    }
}

/// Every obstacle sweep runs twice: once over everything and once over the
/// nodes alone, so node order never depends on edges that cross each other.
fn sweep_all(lp: &mut LinearProgram, obstacles: &[Obstacle], spacing: Spacing) {
    sweep(lp, obstacles, spacing);
    let nodes: Vec<Obstacle> = obstacles.iter().filter(|o| o.is_node).copied().collect();
    sweep(lp, &nodes, spacing);
}

fn node_obstacle(var: usize, lo: i32, extent_across: i32, extent_along: i32) -> Obstacle {
    Obstacle {
        lo,
        hi: lo.saturating_add(extent_across).saturating_sub(1),
        near: Anchor::new(var, 0),
        far: Anchor::new(var, extent_along),
        is_node: true,
    }
}

fn segment_obstacle(lp: &LinearProgram, a: i32, b: i32, ends: (Anchor, Anchor)) -> Obstacle {
    let (near, far) = ordered(lp, ends.0, ends.1);
    Obstacle {
        lo: a.min(b),
        hi: a.max(b),
        near,
        far,
        is_node: false,
    }
}

/// Ends of vertical segment `idx` as anchors. `vars[k]` holds the variable of
/// horizontal segment `2k + 1`.
fn vertical_ends(
    edge: &DrawnEdge,
    to: usize,
    idx: usize,
    nodes: &[NodeBox],
    node_vars: &[usize],
    vars: &[usize],
) -> (Anchor, Anchor) {
    let start = if idx == 0 {
        Anchor::new(node_vars[edge.from], nodes[edge.from].height)
    } else {
        Anchor::new(vars[(idx - 1) / 2], 0)
    };
    let end = if idx + 1 == edge.segments.len() {
        Anchor::new(node_vars[to], 0)
    } else {
        Anchor::new(vars[(idx + 1) / 2], 0)
    };
    (start, end)
}

/// Move node tops and horizontal segments; nodes and vertical segments are
/// pulled up.
fn compact_vertical(drawing: &mut Drawing, spacing: Spacing, passes: usize) -> SolveStats {
    let mut lp = LinearProgram::default();
    let mut obstacles = Vec::new();

    let mut node_vars = Vec::with_capacity(drawing.nodes.len());
    for node in &drawing.nodes {
        let var = lp.add_variable(node.y);
        lp.add_cost(var, 1);
        node_vars.push(var);
        obstacles.push(node_obstacle(var, node.x, node.width, node.height));
    }

    let mut segment_vars: Vec<Vec<usize>> = Vec::with_capacity(drawing.edges.len());
    for edge in &drawing.edges {
        let mut vars = Vec::with_capacity(edge.segments.len() / 2);
        for y in edge.segments.iter().skip(1).step_by(2) {
            vars.push(lp.add_variable(*y));
        }
        segment_vars.push(vars);
    }

    for (edge, vars) in drawing.edges.iter().zip(&segment_vars) {
        let Some(to) = edge.to else {
            continue;
        };
        for (idx, value) in edge.segments.iter().enumerate() {
            if idx % 2 == 1 {
                let ends = (
                    Anchor::new(vars[idx / 2], 0),
                    Anchor::new(vars[idx / 2], 0),
                );
                let (left, right) = (edge.segments[idx - 1], edge.segments[idx + 1]);
                obstacles.push(segment_obstacle(&lp, left, right, ends));
                continue;
            }
            let ends = vertical_ends(edge, to, idx, &drawing.nodes, &node_vars, vars);
            add_segment_length(&mut lp, ends.0, ends.1, spacing.edge);
            obstacles.push(segment_obstacle(&lp, *value, *value, ends));
        }
    }

    sweep_all(&mut lp, &obstacles, spacing);
    let stats = lp.solve(passes);
    debug!(variables = lp.len(), moves = stats.moves, "vertical compaction");

    for (node, var) in drawing.nodes.iter_mut().zip(&node_vars) {
        node.y = lp.value(*var);
    }
    for (edge, vars) in drawing.edges.iter_mut().zip(&segment_vars) {
        for (idx, var) in vars.iter().enumerate() {
            edge.segments[2 * idx + 1] = lp.value(*var);
        }
    }
    stats
}

fn doubled_centre(node: &NodeBox) -> i64 {
    2 * i64::from(node.x) + i64::from(node.width)
}

/// Move node lefts and vertical segments; horizontal segments get shorter.
fn compact_horizontal(
    drawing: &mut Drawing,
    state: &LayoutState,
    spacing: Spacing,
    passes: usize,
) -> SolveStats {
    let mut lp = LinearProgram::default();
    let mut obstacles = Vec::new();

    let mut node_vars = Vec::with_capacity(drawing.nodes.len());
    for node in &drawing.nodes {
        let var = lp.add_variable(node.x);
        node_vars.push(var);
        obstacles.push(node_obstacle(var, node.y, node.height, node.width));
    }

    let mut segment_vars: Vec<Vec<usize>> = Vec::with_capacity(drawing.edges.len());
    for edge in &drawing.edges {
        let mut vars = Vec::with_capacity(edge.segments.len() / 2 + 1);
        for x in edge.segments.iter().step_by(2) {
            vars.push(lp.add_variable(*x));
        }
        segment_vars.push(vars);
    }

    for (edge, vars) in drawing.edges.iter().zip(&segment_vars) {
        let (Some(to), Some(&first), Some(&last)) = (edge.to, vars.first(), vars.last()) else {
            continue;
        };
        lp.add_fixed_distance(node_vars[edge.from], first);
        lp.add_fixed_distance(node_vars[to], last);

        for (idx, value) in edge.segments.iter().enumerate() {
            if idx % 2 == 0 {
                let anchor = Anchor::new(vars[idx / 2], 0);
                if let Some((top, bottom)) = edge.vertical_extent(idx, &drawing.nodes) {
                    obstacles.push(segment_obstacle(&lp, top, bottom, (anchor, anchor)));
                }
                continue;
            }
            let ends = (
                Anchor::new(vars[(idx - 1) / 2], 0),
                Anchor::new(vars[(idx + 1) / 2], 0),
            );
            add_segment_length(&mut lp, ends.0, ends.1, spacing.edge);
            obstacles.push(segment_obstacle(&lp, *value, *value, ends));
        }
    }

    // parents that are still centred keep their children and merge point
    for (idx, node) in state.nodes.iter().enumerate() {
        let parent = &drawing.nodes[idx];
        if let &[a, b] = node.tree_edges.as_slice() {
            let (first, second) = (&drawing.nodes[a], &drawing.nodes[b]);
            if 2 * doubled_centre(parent) == doubled_centre(first) + doubled_centre(second) {
                lp.add_fixed_distance(node_vars[idx], node_vars[a]);
                lp.add_fixed_distance(node_vars[idx], node_vars[b]);
            }
        }
        if let Some(merge) = node.merge_target {
            if doubled_centre(parent) == doubled_centre(&drawing.nodes[merge]) {
                lp.add_fixed_distance(node_vars[idx], node_vars[merge]);
            }
        }
    }

    sweep_all(&mut lp, &obstacles, spacing);
    let stats = lp.solve(passes);
    debug!(variables = lp.len(), moves = stats.moves, "horizontal compaction");

    for (node, var) in drawing.nodes.iter_mut().zip(&node_vars) {
        node.x = lp.value(*var);
    }
    for (edge, vars) in drawing.edges.iter_mut().zip(&segment_vars) {
        for (idx, var) in vars.iter().enumerate() {
            edge.segments[2 * idx] = lp.value(*var);
        }
    }
    stats
}
