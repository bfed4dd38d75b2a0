//! Project snapshots and the persisted project file format.

use crate::graph::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current project file format version.
pub const PROJECT_VERSION: &str = "1.0";
/// Theme used when a project names none.
pub const DEFAULT_THEME_KEY: &str = "Ocean";
/// File extension used for saved projects.
pub const PROJECT_FILE_EXTENSION: &str = "diagram.json";

/// Project read/write errors.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A node as stored in a project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
    #[serde(alias = "ShapeType")]
    pub shape_type: Option<String>,
}

impl Default for NodeRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: None,
            description: None,
            x: 0.0,
            y: 0.0,
            shape_type: Some(crate::graph::ShapeKind::Rectangle.name().to_string()),
        }
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id().to_string(),
            title: Some(node.title.clone()),
            description: (!node.description.is_empty()).then(|| node.description.clone()),
            x: node.x(),
            y: node.y(),
            shape_type: Some(node.shape.name().to_string()),
        }
    }
}

/// An edge as stored in a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeRecord {
    #[serde(alias = "FromId")]
    pub from_id: String,
    #[serde(alias = "ToId")]
    pub to_id: String,
}

/// An independent copy of the whole diagram plus workspace metadata.
///
/// Used for project files, history entries and clipboard-free export. Since
/// every field is owned, cloning a snapshot yields a fully independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(alias = "Version")]
    pub version: String,
    #[serde(alias = "ThemeKey")]
    pub theme_key: String,
    #[serde(alias = "CanvasWidth")]
    pub canvas_width: f64,
    #[serde(alias = "CanvasHeight")]
    pub canvas_height: f64,
    #[serde(alias = "Nodes")]
    pub nodes: Vec<NodeRecord>,
    #[serde(alias = "Edges")]
    pub edges: Vec<EdgeRecord>,
}

impl Default for ProjectState {
    fn default() -> Self {
        let workspace = crate::config::WorkspaceConfig::default();
        Self {
            version: PROJECT_VERSION.to_string(),
            theme_key: DEFAULT_THEME_KEY.to_string(),
            canvas_width: workspace.min_width,
            canvas_height: workspace.min_height,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl ProjectState {
    /// Compact canonical serialization, used only for equality checks.
    pub fn signature(&self) -> String {
        // Serializing plain owned data with string keys cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Serialize to the indented on-disk form.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a project file. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a project file from disk.
    pub fn read_from(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let state = Self::from_json(&json)?;
        log::info!("Loaded project from {:?} ({} nodes)", path, state.nodes.len());
        Ok(state)
    }

    /// Write a project file to disk.
    pub fn write_to(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ProjectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Saved project to {:?}", path);
        Ok(())
    }
}
