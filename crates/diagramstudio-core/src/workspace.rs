//! Logical canvas bounds.
//!
//! The workspace grows in fixed steps whenever a node comes within `padding`
//! of its right or bottom edge, and never shrinks on its own.

use crate::config::WorkspaceConfig;
use crate::graph::Node;
use crate::snap::snap_to_grid;
use kurbo::{Point, Rect, Size};

/// Grows the logical canvas to contain node positions.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSizer {
    config: WorkspaceConfig,
    width: f64,
    height: f64,
}

impl Default for WorkspaceSizer {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}

impl WorkspaceSizer {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            width: config.min_width,
            height: config.min_height,
            config,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size())
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Back to the minimum size.
    pub fn reset(&mut self) {
        self.width = self.config.min_width;
        self.height = self.config.min_height;
    }

    /// Set the size directly, never going below the minimum.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = self.config.min_width.max(width);
        self.height = self.config.min_height.max(height);
    }

    /// Grow until a `width` × `height` box at `(x, y)` fits with padding.
    /// Returns true if the workspace was resized.
    pub fn ensure_fits(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        let padding = self.config.padding;
        let new_width = grow_axis(self.width, x + width + padding, self.config.grow_width);
        let new_height = grow_axis(self.height, y + height + padding, self.config.grow_height);
        let resized = new_width != self.width || new_height != self.height;
        if resized {
            self.width = new_width;
            self.height = new_height;
            log::debug!("Workspace grown to {}x{}", self.width, self.height);
        }
        resized
    }

    /// Clamp a node to the minimum coordinate, optionally snap it, then grow
    /// the workspace to fit it. Non-finite coordinates land on the minimum.
    pub fn normalize_node(&mut self, node: &mut Node, node_size: Size, snap_grid: Option<f64>) -> bool {
        let min = self.config.min_node_coordinate;
        let clamp = |v: f64| if v.is_finite() { v.max(min) } else { min };
        let mut position = Point::new(clamp(node.position.x), clamp(node.position.y));
        if let Some(grid) = snap_grid {
            position = snap_to_grid(position, grid);
        }
        node.position = position;
        self.ensure_fits(position.x, position.y, node_size.width, node_size.height)
    }

    /// Area covering all nodes plus export padding, clamped to the
    /// workspace. `None` for an empty diagram.
    pub fn diagram_bounds<'a>(&self, nodes: impl IntoIterator<Item = &'a Node>, node_size: Size) -> Option<Rect> {
        let extents = nodes
            .into_iter()
            .map(|node| Rect::from_origin_size(node.position, node_size))
            .reduce(|a, b| a.union(b))?;
        let padding = self.config.export_padding;
        Some(Rect::new(
            (extents.x0 - padding).max(0.0),
            (extents.y0 - padding).max(0.0),
            (extents.x1 + padding).min(self.width),
            (extents.y1 + padding).min(self.height),
        ))
    }
}

/// Smallest `current + n * step` (n >= 0) reaching `required`. A zero or
/// non-finite step, or a non-finite result, leaves `current` as is.
fn grow_axis(current: f64, required: f64, step: f64) -> f64 {
    if !(step > 0.0 && step.is_finite() && required.is_finite()) || required <= current {
        return current;
    }
    let mut steps = ((required - current) / step).ceil();
    if current + steps * step < required {
        steps += 1.0;
    }
    let grown = current + steps * step;
    if grown.is_finite() { grown } else { current }
}
