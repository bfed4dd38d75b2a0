//! Deterministic grid auto-layout.

use crate::config::LayoutConfig;
use crate::graph::GraphStore;
use crate::snap::snap_to_grid;
use kurbo::{Point, Size};

/// Grid auto-layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub node_size: Size,
    pub margin: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    /// Snap each position to this grid when set.
    pub snap_grid: Option<f64>,
}

impl GridLayout {
    pub fn new(node_size: Size, config: &LayoutConfig) -> Self {
        Self {
            node_size,
            margin: config.margin,
            gap_x: config.gap_x,
            gap_y: config.gap_y,
            snap_grid: None,
        }
    }

    pub fn with_snap(mut self, grid_size: Option<f64>) -> Self {
        self.snap_grid = grid_size;
        self
    }

    /// Number of columns used for `count` nodes.
    pub fn columns(count: usize) -> usize {
        ((count as f64).sqrt().ceil() as usize).max(1)
    }

    /// Top-left position of the `index`-th of `count` nodes.
    pub fn position(&self, index: usize, count: usize) -> Point {
        let columns = Self::columns(count);
        let row = index / columns;
        let col = index % columns;
        let point = Point::new(
            self.margin + col as f64 * (self.node_size.width + self.gap_x),
            self.margin + row as f64 * (self.node_size.height + self.gap_y),
        );
        match self.snap_grid {
            Some(grid) => snap_to_grid(point, grid),
            None => point,
        }
    }

    /// Positions for `count` nodes in placement order.
    pub fn positions(&self, count: usize) -> Vec<Point> {
        (0..count).map(|i| self.position(i, count)).collect()
    }

    /// Arrange every node of `store` in id order. Returns the number of nodes
    /// moved; an empty store is left untouched.
    pub fn apply(&self, store: &mut GraphStore) -> usize {
        let count = store.node_count();
        for (node, position) in store.nodes_mut().zip(self.positions(count)) {
            node.position = position;
        }
        count
    }
}
