//! Diagram Studio Core Library
//!
//! Editing core for node-and-edge diagrams: the graph store, undo history,
//! edge geometry, grid layout, workspace sizing and project persistence.

pub mod canvas;
pub mod config;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod layout;
pub mod project;
pub mod snap;
pub mod storage;
pub mod workspace;

pub use canvas::{Canvas, ClipboardNode, THEME_KEYS, resolve_theme_key};
pub use config::{EditorConfig, LayoutConfig, NODE_HEIGHT, NODE_WIDTH, RenderThresholds, WorkspaceConfig};
pub use geometry::{
    ArrowHead, EdgeCurve, EdgeGeometry, RenderPlan, RenderTier, connector_point, edge_curve, edge_geometry,
    node_bounds, node_center, node_connector_point, node_outline,
};
pub use graph::{DEFAULT_NODE_TITLE, Edge, GraphStore, Node, NodeId, ShapeKind, UnknownShape};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryManager};
pub use layout::GridLayout;
pub use project::{EdgeRecord, NodeRecord, ProjectError, ProjectState};
pub use snap::{GRID_SIZE, snap_to_grid};
pub use storage::{AutoSaveManager, AutoSaveOutcome, FileStorage, MemoryStorage, SkipReason, Storage, StorageError, StorageResult};
pub use workspace::WorkspaceSizer;
