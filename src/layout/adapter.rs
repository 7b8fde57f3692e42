use crate::config::LayoutConfig;
use crate::ir::{Graph, NodeId};

use super::types::{Arrow, Layout, Point};
use super::LayoutEngine;

/// Runs a top-down engine on the transposed graph and transposes the result,
/// turning it into a left-to-right layout.
#[derive(Debug, Clone)]
pub struct HorizontalAdapter<E> {
    inner: E,
    config: LayoutConfig,
}

impl<E: LayoutEngine> HorizontalAdapter<E> {
    pub fn new(mut inner: E, config: LayoutConfig) -> Self {
        let config = config.sanitized();
        inner.set_config(config.transposed());
        Self { inner, config }
    }
}

fn rotate(arrow: Arrow) -> Arrow {
    match arrow {
        Arrow::Down => Arrow::Right,
        Arrow::Right => Arrow::Down,
        Arrow::Up => Arrow::Left,
        Arrow::Left => Arrow::Up,
        Arrow::None => Arrow::None,
    }
}

fn transpose_graph(graph: &Graph) -> Graph {
    let mut transposed = graph.clone();
    for node in transposed.nodes.values_mut() {
        std::mem::swap(&mut node.width, &mut node.height);
    }
    transposed
}

impl<E: LayoutEngine> LayoutEngine for HorizontalAdapter<E> {
    fn layout(&self, graph: &Graph, entry: NodeId) -> Layout {
        let mut layout = self.inner.layout(&transpose_graph(graph), entry);
        for node in layout.nodes.values_mut() {
            std::mem::swap(&mut node.x, &mut node.y);
            std::mem::swap(&mut node.width, &mut node.height);
        }
        for edge in &mut layout.edges {
            for point in &mut edge.points {
                *point = Point::new(point.y, point.x);
            }
            edge.arrow = rotate(edge.arrow);
        }
        std::mem::swap(&mut layout.width, &mut layout.height);
        layout
    }

    fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn set_config(&mut self, config: LayoutConfig) {
        self.config = config.sanitized();
        self.inner.set_config(self.config.transposed());
    }
}
