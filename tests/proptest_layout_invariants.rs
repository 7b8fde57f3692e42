//! Property-based invariant tests for the grid layout.
//!
//! These tests verify structural invariants that must hold for any graph:
//!
//! 1. Node boxes never overlap, with or without compaction.
//! 2. Identical inputs give identical layouts.
//! 3. No edge passes through a node, with or without compaction.
//! 4. Every edge is reported once, in source order, and polylines are
//!    orthogonal and start/end on their nodes.
//! 5. The left-to-right adapter is the transpose of the top-down layout.
//! 6. No panics on degenerate sizes and spacings.

use cfg_grid_layout::layout::{Arrow, NodeLayout, Point};
use cfg_grid_layout::{compute_layout, Direction, Graph, Layout, LayoutConfig, LayoutStyle, NodeId};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn graph_strategy(max_nodes: usize) -> impl Strategy<Value = (Graph, NodeId)> {
    (1usize..=max_nodes)
        .prop_flat_map(|count| {
            let node = (
                10i32..=200,
                10i32..=80,
                prop::collection::vec(1..=count as u64, 0..4),
            );
            (prop::collection::vec(node, count), 1..=count as u64)
        })
        .prop_map(|(nodes, entry)| {
            let mut graph = Graph::new();
            for (idx, (width, height, _)) in nodes.iter().enumerate() {
                graph.add_node(idx as u64 + 1, *width, *height);
            }
            for (idx, (_, _, targets)) in nodes.iter().enumerate() {
                for target in targets {
                    graph.add_edge(idx as u64 + 1, *target);
                }
            }
            (graph, entry)
        })
}

fn style_strategy() -> impl Strategy<Value = LayoutStyle> {
    prop_oneof![
        Just(LayoutStyle::Narrow),
        Just(LayoutStyle::Medium),
        Just(LayoutStyle::Wide),
    ]
}

fn config(layout_style: LayoutStyle, enable_compaction: bool) -> LayoutConfig {
    LayoutConfig {
        layout_style,
        enable_compaction,
        ..LayoutConfig::default()
    }
}

fn first_overlap(layout: &Layout) -> Option<(NodeId, NodeId)> {
    let nodes: Vec<&NodeLayout> = layout.nodes.values().collect();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.overlaps(b) {
                return Some((a.id, b.id));
            }
        }
    }
    None
}

fn crosses_interior(a: Point, b: Point, node: &NodeLayout) -> bool {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    if x0 == x1 {
        node.x < x0 && x0 < node.right() && y0.max(node.y) < y1.min(node.bottom())
    } else {
        node.y < y0 && y0 < node.bottom() && x0.max(node.x) < x1.min(node.right())
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Node boxes never overlap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nodes_never_overlap(
        (graph, entry) in graph_strategy(14),
        layout_style in style_strategy(),
        enable_compaction in any::<bool>(),
    ) {
        let layout = compute_layout(&graph, entry, &config(layout_style, enable_compaction));
        prop_assert_eq!(layout.nodes.len(), graph.len());
        prop_assert_eq!(first_overlap(&layout), None);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_is_deterministic((graph, entry) in graph_strategy(12), layout_style in style_strategy()) {
        let config = config(layout_style, true);
        let first = compute_layout(&graph, entry, &config);
        let second = compute_layout(&graph.clone(), entry, &config);
        prop_assert_eq!(first, second);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Edges clear nodes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn edges_clear_nodes(
        (graph, entry) in graph_strategy(12),
        layout_style in style_strategy(),
        enable_compaction in any::<bool>(),
    ) {
        let layout = compute_layout(&graph, entry, &config(layout_style, enable_compaction));
        for edge in &layout.edges {
            let last = edge.points.len().saturating_sub(2);
            for (idx, pair) in edge.points.windows(2).enumerate() {
                for node in layout.nodes.values() {
                    if (idx == 0 && node.id == edge.from) || (idx == last && node.id == edge.to) {
                        continue;
                    }
                    prop_assert!(
                        !crosses_interior(pair[0], pair[1], node),
                        "edge {} -> {} crosses node {}", edge.from, edge.to, node.id
                    );
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Edge bookkeeping and polyline shape
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn polylines_are_orthogonal_and_attached(
        (graph, entry) in graph_strategy(12),
        layout_style in style_strategy(),
        enable_compaction in any::<bool>(),
    ) {
        let layout = compute_layout(&graph, entry, &config(layout_style, enable_compaction));
        prop_assert_eq!(layout.edges.len(), graph.edge_count());

        let expected: Vec<(NodeId, usize)> = graph
            .nodes
            .iter()
            .flat_map(|(id, node)| (0..node.edges.len()).map(move |index| (*id, index)))
            .collect();
        let actual: Vec<(NodeId, usize)> =
            layout.edges.iter().map(|edge| (edge.from, edge.index)).collect();
        prop_assert_eq!(actual, expected);

        for edge in &layout.edges {
            prop_assert_eq!(edge.arrow, Arrow::Down);
            prop_assert!(edge.points.len() >= 2);
            for pair in edge.points.windows(2) {
                prop_assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
            }
            let (source, target) = (&layout.nodes[&edge.from], &layout.nodes[&edge.to]);
            let (first, last) = (edge.points[0], edge.points[edge.points.len() - 1]);
            prop_assert_eq!(first.y, source.bottom());
            prop_assert_eq!(last.y, target.y);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Left-to-right is the transpose of top-down
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn left_right_transposes_top_down((graph, entry) in graph_strategy(10)) {
        let mut transposed = graph.clone();
        for node in transposed.nodes.values_mut() {
            std::mem::swap(&mut node.width, &mut node.height);
        }
        let config = LayoutConfig {
            direction: Direction::LeftRight,
            block_vertical_spacing: 25,
            edge_horizontal_spacing: 6,
            ..LayoutConfig::default()
        };
        let horizontal = compute_layout(&graph, entry, &config);
        let top_down = LayoutConfig {
            direction: Direction::TopDown,
            ..config.transposed()
        };
        let vertical = compute_layout(&transposed, entry, &top_down);

        prop_assert_eq!(horizontal.width, vertical.height);
        prop_assert_eq!(horizontal.height, vertical.width);
        for (id, node) in &horizontal.nodes {
            let other = &vertical.nodes[id];
            prop_assert_eq!((node.x, node.y), (other.y, other.x));
            prop_assert_eq!((node.width, node.height), (other.height, other.width));
        }
        for (edge, other) in horizontal.edges.iter().zip(&vertical.edges) {
            let flipped: Vec<Point> = other.points.iter().map(|p| Point::new(p.y, p.x)).collect();
            prop_assert_eq!(&edge.points, &flipped);
            prop_assert_eq!(edge.arrow, Arrow::Right);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Degenerate sizes and spacings
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn degenerate_inputs_do_not_panic(
        (graph, entry) in graph_strategy(10),
        spacing in -20i32..=5,
        passes in 0u32..=3,
        zero_sizes in any::<bool>(),
    ) {
        let mut graph = graph;
        if zero_sizes {
            for node in graph.nodes.values_mut() {
                node.width = 0;
                node.height = 0;
            }
        }
        let config = LayoutConfig {
            block_vertical_spacing: spacing,
            block_horizontal_spacing: spacing,
            edge_vertical_spacing: spacing,
            edge_horizontal_spacing: spacing,
            compaction_passes: passes,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&graph, entry, &config);
        prop_assert_eq!(layout.nodes.len(), graph.len());
        prop_assert!(layout.width >= 0 && layout.height >= 0);
    }
}
