//! Grid layout for control-flow style graphs.
//!
//! Phases, in order, all working on one [`LayoutState`]:
//!
//! 1. cycle removal and topological order (`ranking`)
//! 2. row assignment and spanning-forest extraction (`ranking`)
//! 3. subtree placement with silhouette merging (`placement`)
//! 4. main-column selection, rough routing, offsets and centering (`routing`)
//! 5. pixel conversion (`coords`)
//! 6. optional compaction followed by a crop (`compaction`, `coords`)

mod adapter;
mod compaction;
mod coords;
mod lp;
mod placement;
mod ranking;
mod routing;
pub(crate) mod types;

pub use adapter::HorizontalAdapter;
pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, debug_span, warn};

use crate::config::LayoutConfig;
use crate::ir::{Direction, Graph, NodeId};
use crate::list_pool::{List, ListPool};

/// A layout algorithm turning a graph into positioned nodes and routed edges.
pub trait LayoutEngine {
    fn layout(&self, graph: &Graph, entry: NodeId) -> Layout;

    fn config(&self) -> &LayoutConfig;

    fn set_config(&mut self, config: LayoutConfig);
}

/// Layered grid layout producing top-down drawings with orthogonal edges.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    config: LayoutConfig,
}

impl GridLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }
}

impl LayoutEngine for GridLayout {
    fn layout(&self, graph: &Graph, entry: NodeId) -> Layout {
        let _span = debug_span!(
            "grid_layout",
            nodes = graph.len(),
            edges = graph.edge_count(),
            entry
        )
        .entered();
        if graph.is_empty() {
            return Layout::default();
        }

        let config = &self.config;
        let mut state = LayoutState::new(graph, entry, config);
        ranking::remove_cycles(&mut state);
        ranking::assign_rows(&mut state);
        ranking::select_tree_edges(&mut state);
        placement::find_merge_points(&mut state);
        placement::place_subtrees(&mut state);
        routing::select_main_columns(&mut state);
        routing::route_edges(&mut state);
        routing::assign_offsets(&mut state);

        let mut drawing = coords::convert_to_pixels(&state);
        if config.enable_compaction {
            compaction::compact(&mut drawing, &state);
            drawing.crop(config.crop_margin);
        }
        let layout = drawing.into_layout(&state);
        debug!(width = layout.width, height = layout.height, "layout finished");
        layout
    }

    fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn set_config(&mut self, config: LayoutConfig) {
        self.config = config.sanitized();
    }
}

/// Lay out `graph` starting from `entry` (a missing entry falls back to the
/// node with the smallest id). Never fails; identical inputs give identical
/// outputs.
pub fn compute_layout(graph: &Graph, entry: NodeId, config: &LayoutConfig) -> Layout {
    match config.direction {
        Direction::TopDown => GridLayout::new(config.clone()).layout(graph, entry),
        Direction::LeftRight => {
            HorizontalAdapter::new(GridLayout::default(), config.clone()).layout(graph, entry)
        }
    }
}

// ── Working state ───────────────────────────────────────────────────

/// Per-row left/right boundary of a placed subtree.
///
/// Both sides are delta lists in [`LayoutState::silhouettes`]: the head holds
/// the boundary of the subtree's first row relative to its root column, and
/// every following entry the change from the row above. Moving a whole
/// silhouette is a single head update.
#[derive(Debug, Clone, Copy, Default)]
struct Silhouette {
    left: List,
    right: List,
    /// Absolute boundaries of the deepest row, needed to re-link delta lists.
    last_left: i32,
    last_right: i32,
    /// Horizontal extent over all rows.
    min_left: i32,
    max_right: i32,
    row_count: i32,
}

#[derive(Debug, Clone)]
struct GridNode {
    id: NodeId,
    width: i32,
    height: i32,
    /// Indices into [`LayoutState::edges`], in caller order.
    out_edges: Vec<usize>,
    /// Cycle-free subset of the targets.
    dag_edges: Vec<usize>,
    /// Spanning-forest children.
    tree_edges: Vec<usize>,
    parent: Option<usize>,
    /// Position in DFS discovery order.
    discovery: usize,
    row: i32,
    /// Relative to the tree parent during placement, absolute afterwards.
    col: i32,
    silhouette: Silhouette,
    /// Grandchild where two or more tree branches reconverge.
    merge_target: Option<usize>,
    /// Column of the single tree child relative to this node, set on the
    /// branch that owns a reconvergence point.
    merge_hint: Option<i32>,
}

/// End of one segment of a roughly routed edge.
///
/// Segments alternate vertical, horizontal, vertical... A vertical segment
/// runs in edge column `col` and ends at `row`; a horizontal one runs in gap
/// row `row` and ends at `col`. Ends use doubled coordinates: gap row `r` is
/// `2r`, node row `r` is `2r + 1`, and likewise for edge/node columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Waypoint {
    row: i32,
    col: i32,
    offset: i32,
    /// Sum of the bend directions at both ends of the segment: -1 for a
    /// neighbour going left or up, +1 for right or down.
    kind: i32,
}

#[derive(Debug, Clone)]
struct GridEdge {
    from: usize,
    target: NodeId,
    /// `None` when the target is not part of the graph.
    to: Option<usize>,
    /// Position in the source's edge list.
    index: usize,
    /// Closes a cycle, so excluded from the DAG subset.
    is_loop: bool,
    main_column: i32,
    points: Vec<Waypoint>,
    priority: i32,
}

/// Everything the phases share for one layout call.
struct LayoutState<'a> {
    config: &'a LayoutConfig,
    nodes: Vec<GridNode>,
    edges: Vec<GridEdge>,
    entry: usize,
    /// DFS post-order; reversed it is a topological order of the DAG edges.
    block_order: Vec<usize>,
    rows: i32,
    columns: i32,
    silhouettes: ListPool<i32>,
    /// Reserved width of each of the `columns + 1` edge columns.
    edge_column_width: Vec<i32>,
    /// Reserved height of each of the `rows + 1` gap rows.
    edge_row_height: Vec<i32>,
}

impl<'a> LayoutState<'a> {
    fn new(graph: &Graph, entry: NodeId, config: &'a LayoutConfig) -> Self {
        let index: BTreeMap<NodeId, usize> = graph
            .nodes
            .keys()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();

        let mut nodes = Vec::with_capacity(graph.len());
        let mut edges = Vec::with_capacity(graph.edge_count());
        for (idx, (id, node)) in graph.nodes.iter().enumerate() {
            let mut out_edges = Vec::with_capacity(node.edges.len());
            for (edge_index, edge) in node.edges.iter().enumerate() {
                let to = index.get(&edge.target).copied();
                if to.is_none() {
                    warn!(from = id, to = edge.target, "edge target missing from graph, edge skipped");
                }
                out_edges.push(edges.len());
                edges.push(GridEdge {
                    from: idx,
                    target: edge.target,
                    to,
                    index: edge_index,
                    is_loop: false,
                    main_column: 0,
                    points: Vec::new(),
                    priority: 0,
                });
            }
            nodes.push(GridNode {
                id: *id,
                width: node.width.max(0),
                height: node.height.max(0),
                out_edges,
                dag_edges: Vec::new(),
                tree_edges: Vec::new(),
                parent: None,
                discovery: 0,
                row: 0,
                col: 0,
                silhouette: Silhouette::default(),
                merge_target: None,
                merge_hint: None,
            });
        }

        let entry = match index.get(&entry) {
            Some(&idx) => idx,
            None => {
                warn!(entry, "entry node missing from graph, starting from the first node");
                0
            }
        };

        Self {
            config,
            nodes,
            edges,
            entry,
            block_order: Vec::with_capacity(graph.len()),
            rows: 0,
            columns: 0,
            silhouettes: ListPool::with_capacity(graph.len() * 4),
            edge_column_width: Vec::new(),
            edge_row_height: Vec::new(),
        }
    }

    /// Number of routed edges entering each node.
    fn incoming_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nodes.len()];
        for edge in &self.edges {
            if let Some(to) = edge.to {
                counts[to] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
fn test_state<'a>(graph: &Graph, entry: NodeId, config: &'a LayoutConfig) -> LayoutState<'a> {
    let mut state = LayoutState::new(graph, entry, config);
    ranking::remove_cycles(&mut state);
    ranking::assign_rows(&mut state);
    ranking::select_tree_edges(&mut state);
    state
}

#[cfg(test)]
fn graph_from(nodes: &[(NodeId, &[NodeId])]) -> Graph {
    let mut graph = Graph::new();
    for (id, _) in nodes {
        graph.add_node(*id, 100, 40);
    }
    for (id, targets) in nodes {
        for target in *targets {
            graph.add_edge(*id, *target);
        }
    }
    graph
}
