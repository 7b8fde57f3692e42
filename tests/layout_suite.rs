use cfg_grid_layout::layout::{Arrow, EdgeLayout, NodeLayout, Point};
use cfg_grid_layout::{
    compute_layout, parse_graph, Direction, Graph, Layout, LayoutConfig, LayoutStyle, NodeId,
};

fn graph(nodes: &[(NodeId, i32, i32, &[NodeId])]) -> Graph {
    let mut graph = Graph::new();
    for (id, width, height, _) in nodes {
        graph.add_node(*id, *width, *height);
    }
    for (id, _, _, targets) in nodes {
        for target in *targets {
            graph.add_edge(*id, *target);
        }
    }
    graph
}

fn uncompacted() -> LayoutConfig {
    LayoutConfig {
        enable_compaction: false,
        ..LayoutConfig::default()
    }
}

fn centre_x(node: &NodeLayout) -> i32 {
    node.x + node.width / 2
}

fn assert_no_overlap(layout: &Layout, context: &str) {
    let nodes: Vec<&NodeLayout> = layout.nodes.values().collect();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!(!a.overlaps(b), "{context}: {a:?} overlaps {b:?}");
        }
    }
}

fn assert_orthogonal(edge: &EdgeLayout, context: &str) {
    for pair in edge.points.windows(2) {
        assert!(
            pair[0].x == pair[1].x || pair[0].y == pair[1].y,
            "{context}: diagonal step {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// True when the axis-aligned segment `a`-`b` passes through the open
/// interior of `node`.
fn crosses_interior(a: Point, b: Point, node: &NodeLayout) -> bool {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    if x0 == x1 {
        node.x < x0 && x0 < node.right() && y0.max(node.y) < y1.min(node.bottom())
    } else {
        node.y < y0 && y0 < node.bottom() && x0.max(node.x) < x1.min(node.right())
    }
}

fn assert_edges_clear_nodes(layout: &Layout, context: &str) {
    for edge in &layout.edges {
        let last = edge.points.len().saturating_sub(2);
        for (idx, pair) in edge.points.windows(2).enumerate() {
            for node in layout.nodes.values() {
                let own_stub =
                    (idx == 0 && node.id == edge.from) || (idx == last && node.id == edge.to);
                if own_stub {
                    continue;
                }
                assert!(
                    !crosses_interior(pair[0], pair[1], node),
                    "{context}: edge {} -> {} crosses node {}",
                    edge.from,
                    edge.to,
                    node.id
                );
            }
        }
    }
}

// Scenario A: a lone node.

#[test]
fn single_node_gets_fixed_margins() {
    let graph = graph(&[(1, 120, 40, &[])]);
    let config = uncompacted();
    let layout = compute_layout(&graph, 1, &config);
    assert!(layout.edges.is_empty());
    assert_eq!(
        layout.width,
        120 + 2 * config.edge_horizontal_spacing + config.block_horizontal_spacing
    );
    assert_eq!(layout.height, 40 + 2 * config.edge_vertical_spacing);

    let config = LayoutConfig::default();
    let layout = compute_layout(&graph, 1, &config);
    assert_eq!(layout.width, 120 + 2 * config.crop_margin);
    assert_eq!(layout.height, 40 + 2 * config.crop_margin);
    let node = &layout.nodes[&1];
    assert_eq!((node.x, node.y), (config.crop_margin, config.crop_margin));
}

// Scenario B: a chain.

#[test]
fn chain_is_one_straight_segment() {
    let graph = graph(&[(1, 120, 40, &[2]), (2, 80, 60, &[])]);
    for config in [uncompacted(), LayoutConfig::default()] {
        let layout = compute_layout(&graph, 1, &config);
        let (a, b) = (&layout.nodes[&1], &layout.nodes[&2]);
        assert!(b.y >= a.bottom());
        assert_eq!(centre_x(a), centre_x(b));

        let edge = &layout.edges[0];
        assert_eq!((edge.from, edge.to, edge.index), (1, 2, 0));
        assert_eq!(edge.arrow, Arrow::Down);
        assert_eq!(edge.points.len(), 2);
        assert_eq!(edge.points[0].x, edge.points[1].x);
        assert_eq!(edge.points[0].y, a.bottom());
        assert_eq!(edge.points[1].y, b.y);
    }
}

// Scenario C: a diamond.

#[test]
fn diamond_branches_take_distinct_columns() {
    let graph = graph(&[
        (1, 100, 40, &[2, 3]),
        (2, 100, 40, &[4]),
        (3, 100, 40, &[4]),
        (4, 100, 40, &[]),
    ]);
    for layout_style in [LayoutStyle::Narrow, LayoutStyle::Medium, LayoutStyle::Wide] {
        let config = LayoutConfig {
            layout_style,
            ..uncompacted()
        };
        let layout = compute_layout(&graph, 1, &config);
        let (a, b, c, d) = (
            &layout.nodes[&1],
            &layout.nodes[&2],
            &layout.nodes[&3],
            &layout.nodes[&4],
        );
        assert!(d.y >= b.bottom().max(c.bottom()), "{layout_style:?}");
        assert!(b.right() <= c.x, "{layout_style:?}: branches share a column");
        assert!(
            centre_x(b) <= centre_x(a) && centre_x(a) <= centre_x(c),
            "{layout_style:?}: parent outside its branches"
        );
        assert_no_overlap(&layout, "diamond");
        for edge in &layout.edges {
            assert_orthogonal(edge, "diamond");
            assert_eq!(edge.arrow, Arrow::Down);
        }
    }
}

#[test]
fn diamond_survives_compaction() {
    let graph = graph(&[
        (1, 100, 40, &[2, 3]),
        (2, 100, 40, &[4]),
        (3, 100, 40, &[4]),
        (4, 100, 40, &[]),
    ]);
    let layout = compute_layout(&graph, 1, &LayoutConfig::default());
    let (b, c, d) = (&layout.nodes[&2], &layout.nodes[&3], &layout.nodes[&4]);
    assert!(b.right() <= c.x);
    assert!(d.y >= b.bottom().max(c.bottom()));
    assert_no_overlap(&layout, "compacted diamond");
    assert_edges_clear_nodes(&layout, "compacted diamond");
}

// Scenario D: a self-loop.

#[test]
fn self_loop_leaves_and_reenters_its_node() {
    let graph = graph(&[(1, 100, 40, &[1, 2]), (2, 100, 40, &[])]);
    let layout = compute_layout(&graph, 1, &uncompacted());
    let (a, b) = (&layout.nodes[&1], &layout.nodes[&2]);
    let edge = &layout.edges[0];
    assert_eq!((edge.from, edge.to), (1, 1));
    assert_eq!(edge.arrow, Arrow::Down);
    assert!(edge.points.len() >= 4);
    assert_eq!(edge.points[0].y, a.bottom());
    assert_eq!(edge.points[edge.points.len() - 1].y, a.y);
    assert_orthogonal(edge, "self loop");
    // stays between the rows around A, never reaching B's row
    assert!(edge.points.iter().all(|point| point.y < b.y));
    assert_edges_clear_nodes(&layout, "self loop");
}

// Scenario E: disconnected components.

#[test]
fn components_are_side_by_side_in_discovery_order() {
    let graph = graph(&[
        (1, 100, 40, &[2]),
        (2, 100, 40, &[]),
        (3, 100, 40, &[4]),
        (4, 100, 40, &[]),
        (5, 60, 30, &[]),
    ]);
    for config in [uncompacted(), LayoutConfig::default()] {
        let layout = compute_layout(&graph, 3, &config);
        let right_of = |ids: &[NodeId]| ids.iter().map(|id| layout.nodes[id].right()).max();
        let left_of = |ids: &[NodeId]| ids.iter().map(|id| layout.nodes[id].x).min();
        // entry component first, then the rest by id
        assert!(right_of(&[3, 4]) <= left_of(&[1, 2]));
        assert!(right_of(&[1, 2]) <= left_of(&[5]));
        assert_no_overlap(&layout, "components");
    }
}

// Properties over a denser control-flow graph.

fn loop_nest() -> Graph {
    graph(&[
        (1, 140, 60, &[2]),
        (2, 100, 40, &[3, 7]),
        (3, 80, 80, &[4, 5]),
        (4, 120, 40, &[6]),
        (5, 60, 40, &[6, 3]),
        (6, 100, 30, &[2]),
        (7, 160, 50, &[8, 8]),
        (8, 90, 40, &[]),
    ])
}

#[test]
fn loop_nest_properties_hold_in_every_style() {
    let graph = loop_nest();
    for layout_style in [LayoutStyle::Narrow, LayoutStyle::Medium, LayoutStyle::Wide] {
        for enable_compaction in [false, true] {
            let config = LayoutConfig {
                layout_style,
                enable_compaction,
                ..LayoutConfig::default()
            };
            let context = format!("{layout_style:?}, compaction {enable_compaction}");
            let layout = compute_layout(&graph, 1, &config);
            assert_eq!(layout.nodes.len(), 8);
            assert_eq!(layout.edges.len(), 11);
            assert_no_overlap(&layout, &context);
            for edge in &layout.edges {
                assert_orthogonal(edge, &context);
                assert!(!edge.points.is_empty(), "{context}: unrouted edge");
            }
            assert_edges_clear_nodes(&layout, &context);
            for node in layout.nodes.values() {
                assert!(node.right() <= layout.width && node.bottom() <= layout.height);
            }
        }
    }
}

#[test]
fn edges_keep_source_order() {
    let layout = compute_layout(&loop_nest(), 1, &LayoutConfig::default());
    let order: Vec<(NodeId, usize)> = layout.edges.iter().map(|e| (e.from, e.index)).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
    let parallel: Vec<&EdgeLayout> = layout.edges.iter().filter(|e| e.from == 7).collect();
    assert_eq!(parallel.len(), 2);
    assert_ne!(parallel[0].points, parallel[1].points);
}

#[test]
fn layout_is_deterministic() {
    let graph = loop_nest();
    let config = LayoutConfig::default();
    let first = compute_layout(&graph, 1, &config);
    for _ in 0..3 {
        assert_eq!(compute_layout(&graph, 1, &config), first);
    }
}

#[test]
fn left_right_direction_transposes_the_drawing() {
    let graph = graph(&[(1, 120, 40, &[2]), (2, 80, 60, &[])]);
    let config = LayoutConfig {
        direction: Direction::LeftRight,
        ..LayoutConfig::default()
    };
    let layout = compute_layout(&graph, 1, &config);
    let (a, b) = (&layout.nodes[&1], &layout.nodes[&2]);
    assert_eq!((a.width, a.height), (120, 40));
    assert!(b.x >= a.right());
    assert_eq!(layout.edges[0].arrow, Arrow::Right);
    assert_eq!(layout.edges[0].points[0].x, a.right());
}

#[test]
fn parsed_document_lays_out() {
    let parsed = parse_graph(
        r#"{"entry": 10, "nodes": [
            {"id": 10, "width": 120, "height": 40, "edges": [20, 30]},
            {"id": 20, "width": 100, "height": 40, "edges": [30]},
            {"id": 30, "width": 100, "height": 40, "edges": [10]}
        ]}"#,
    )
    .unwrap();
    let entry = parsed.entry_or_first().unwrap();
    let layout = compute_layout(&parsed.graph, entry, &LayoutConfig::default());
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.edges.len(), 4);
    assert!(layout.edges.iter().all(|edge| edge.arrow == Arrow::Down));
    assert_no_overlap(&layout, "parsed");
}
