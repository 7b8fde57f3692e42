use crate::config::{load_config, LayoutConfig, LayoutStyle};
use crate::ir::{Direction, NodeId};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_graph;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "cfglayout",
    version,
    about = "Grid layout for control-flow graphs (JSON in, positioned nodes and orthogonal edges out)"
)]
pub struct Args {
    /// Input graph (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (spacings, layoutStyle, enableCompaction, ...)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Entry node, overriding the one in the input
    #[arg(long = "entry")]
    pub entry: Option<NodeId>,

    /// Layout style: narrow, medium or wide
    #[arg(long = "style", value_parser = parse_style)]
    pub style: Option<LayoutStyle>,

    /// Direction: TD or LR
    #[arg(long = "direction", value_parser = parse_direction)]
    pub direction: Option<Direction>,

    /// Skip the compaction pass
    #[arg(long = "no-compaction")]
    pub no_compaction: bool,
}

fn parse_style(value: &str) -> std::result::Result<LayoutStyle, String> {
    LayoutStyle::from_token(value).ok_or_else(|| format!("unknown layout style '{value}'"))
}

fn parse_direction(value: &str) -> std::result::Result<Direction, String> {
    Direction::from_token(value).ok_or_else(|| format!("unknown direction '{value}'"))
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    let input = read_input(args.input.as_deref())?;
    let parsed = parse_graph(&input)?;
    let entry = args
        .entry
        .or_else(|| parsed.entry_or_first())
        .ok_or_else(|| anyhow::anyhow!("Input graph has no nodes"))?;

    let layout = compute_layout(&parsed.graph, entry, &config);
    info!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        width = layout.width,
        height = layout.height,
        "layout computed"
    );
    write_layout_dump(args.output.as_deref(), &layout)?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn apply_overrides(mut config: LayoutConfig, args: &Args) -> LayoutConfig {
    if let Some(style) = args.style {
        config.layout_style = style;
    }
    if let Some(direction) = args.direction {
        config.direction = direction;
    }
    if args.no_compaction {
        config.enable_compaction = false;
    }
    config
}
