use crate::ir::NodeId;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: i32,
    pub height: i32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: NodeId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: NodeId,
    pub to: NodeId,
    pub index: usize,
    pub arrow: &'static str,
    pub points: Vec<[i32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from,
                to: edge.to,
                index: edge.index,
                arrow: edge.arrow.as_str(),
                points: edge.points.iter().map(|point| [point.x, point.y]).collect(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

/// Write the dump as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_layout_dump(path: Option<&Path>, layout: &Layout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
