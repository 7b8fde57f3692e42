#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod list_pool;
pub mod parser;
pub mod segment_tree;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{load_config, LayoutConfig, LayoutStyle};
pub use ir::{Direction, Graph, NodeId};
pub use layout::{compute_layout, GridLayout, HorizontalAdapter, Layout, LayoutEngine};
pub use parser::{parse_graph, ParseError, ParseOutput};
