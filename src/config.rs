use crate::ir::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overall look of the placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutStyle {
    Narrow,
    #[default]
    Medium,
    Wide,
}

impl LayoutStyle {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "narrow" => Some(Self::Narrow),
            "medium" => Some(Self::Medium),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }

    /// Tight packing takes the exact minimal contour shift between sibling
    /// subtrees; loose packing shifts past the bounding box of the rows both
    /// subtrees share.
    pub fn tight_packing(self) -> bool {
        matches!(self, Self::Narrow)
    }

    /// Whether a parent is centred over the horizontal extent of its whole
    /// subtree (clamped to its first and last child) instead of between its
    /// first and last direct child.
    pub fn parent_over_extent(self) -> bool {
        !matches!(self, Self::Wide)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Minimum gap between node rows.
    pub block_vertical_spacing: i32,
    /// Minimum gap between node columns.
    pub block_horizontal_spacing: i32,
    /// Spacing between parallel horizontal edge segments.
    pub edge_vertical_spacing: i32,
    /// Spacing between parallel vertical edge segments.
    pub edge_horizontal_spacing: i32,
    pub layout_style: LayoutStyle,
    pub enable_compaction: bool,
    /// Rounds of the approximate solver per compaction axis.
    pub compaction_passes: u32,
    /// Margin kept around the content when the drawing is cropped.
    pub crop_margin: i32,
    pub direction: Direction,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            block_vertical_spacing: 40,
            block_horizontal_spacing: 20,
            edge_vertical_spacing: 10,
            edge_horizontal_spacing: 10,
            layout_style: LayoutStyle::Medium,
            enable_compaction: true,
            compaction_passes: 1,
            crop_margin: 10,
            direction: Direction::TopDown,
        }
    }
}

impl LayoutConfig {
    /// Clamp values the engine cannot work with.
    pub fn sanitized(mut self) -> Self {
        self.block_vertical_spacing = self.block_vertical_spacing.max(0);
        self.block_horizontal_spacing = self.block_horizontal_spacing.max(0);
        self.edge_vertical_spacing = self.edge_vertical_spacing.max(0);
        self.edge_horizontal_spacing = self.edge_horizontal_spacing.max(0);
        self.crop_margin = self.crop_margin.max(0);
        self
    }

    /// Same settings with the horizontal and vertical spacings exchanged,
    /// used when a left-to-right drawing is produced by rotating a top-down
    /// one.
    pub fn transposed(&self) -> Self {
        Self {
            block_vertical_spacing: self.block_horizontal_spacing,
            block_horizontal_spacing: self.block_vertical_spacing,
            edge_vertical_spacing: self.edge_horizontal_spacing,
            edge_horizontal_spacing: self.edge_vertical_spacing,
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    block_vertical_spacing: Option<i32>,
    block_horizontal_spacing: Option<i32>,
    edge_vertical_spacing: Option<i32>,
    edge_horizontal_spacing: Option<i32>,
    layout_style: Option<LayoutStyle>,
    enable_compaction: Option<bool>,
    compaction_passes: Option<u32>,
    crop_margin: Option<i32>,
    direction: Option<Direction>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let config = LayoutConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    Ok(apply_config_file(config, &contents)?.sanitized())
}

fn apply_config_file(mut config: LayoutConfig, contents: &str) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(v) = parsed.block_vertical_spacing {
        config.block_vertical_spacing = v;
    }
    if let Some(v) = parsed.block_horizontal_spacing {
        config.block_horizontal_spacing = v;
    }
    if let Some(v) = parsed.edge_vertical_spacing {
        config.edge_vertical_spacing = v;
    }
    if let Some(v) = parsed.edge_horizontal_spacing {
        config.edge_horizontal_spacing = v;
    }
    if let Some(v) = parsed.layout_style {
        config.layout_style = v;
    }
    if let Some(v) = parsed.enable_compaction {
        config.enable_compaction = v;
    }
    if let Some(v) = parsed.compaction_passes {
        config.compaction_passes = v;
    }
    if let Some(v) = parsed.crop_margin {
        config.crop_margin = v;
    }
    if let Some(v) = parsed.direction {
        config.direction = v;
    }
    Ok(config)
}
