//! Editor configuration.
//!
//! Every tunable constant of the engine lives here so collaborators (and tests)
//! can adjust thresholds without touching the algorithms.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default node footprint width.
pub const NODE_WIDTH: f64 = 170.0;
/// Default node footprint height.
pub const NODE_HEIGHT: f64 = 92.0;

/// Render tier thresholds.
///
/// The lightweight tier is used while a node is dragged or once the graph
/// outgrows `max_full_nodes` / `max_full_edges`. Inside the lightweight tier
/// arrowheads disappear once the edge count reaches `arrow_suppress_edges`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderThresholds {
    pub max_full_nodes: usize,
    pub max_full_edges: usize,
    pub arrow_suppress_edges: usize,
}

impl Default for RenderThresholds {
    fn default() -> Self {
        Self {
            max_full_nodes: 180,
            max_full_edges: 360,
            arrow_suppress_edges: 280,
        }
    }
}

/// Logical canvas sizing rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceConfig {
    pub min_width: f64,
    pub min_height: f64,
    pub grow_width: f64,
    pub grow_height: f64,
    pub padding: f64,
    /// Smallest coordinate a node may be placed at.
    pub min_node_coordinate: f64,
    /// Padding around node extents when computing the export area.
    pub export_padding: f64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            min_width: 2500.0,
            min_height: 1600.0,
            grow_width: 1200.0,
            grow_height: 900.0,
            padding: 260.0,
            min_node_coordinate: 10.0,
            export_padding: 80.0,
        }
    }
}

/// Grid auto-layout spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub margin: f64,
    pub gap_x: f64,
    pub gap_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 80.0,
            gap_x: 84.0,
            gap_y: 82.0,
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Grid spacing used when snapping is enabled.
    pub grid_size: f64,
    pub history_capacity: usize,
    pub autosave_interval_secs: u64,
    pub render: RenderThresholds,
    pub workspace: WorkspaceConfig,
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            grid_size: crate::snap::GRID_SIZE,
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
            autosave_interval_secs: crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS,
            render: RenderThresholds::default(),
            workspace: WorkspaceConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Node footprint as a size.
    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    /// Parse a configuration; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
