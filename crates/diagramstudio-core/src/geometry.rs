//! Connector, edge curve and arrowhead geometry.
//!
//! Everything here is pure math over node footprints. A renderer asks for a
//! [`RenderPlan`] once per frame and then draws the [`EdgeGeometry`] it gets
//! back; nothing in this module draws pixels.

use crate::config::RenderThresholds;
use crate::graph::{GraphStore, Node, NodeId, ShapeKind};
use kurbo::{BezPath, CubicBez, Ellipse, Line, Point, Rect, Shape as KurboShape, Size, Vec2};

/// Arrowhead length along the edge.
pub const ARROW_SIZE: f64 = 9.0;
/// Arrowhead half-width as a fraction of [`ARROW_SIZE`].
pub const ARROW_SPREAD: f64 = 0.55;
/// Smallest horizontal control-point offset of a full-tier edge.
pub const MIN_CONTROL_OFFSET: f64 = 55.0;
/// Control-point offset as a fraction of the horizontal span.
pub const CONTROL_OFFSET_RATIO: f64 = 0.35;

const CENTER_EPSILON: f64 = 0.001;
const DENOMINATOR_EPSILON: f64 = 0.001;
const TANGENT_EPSILON: f64 = 0.001;

/// Footprint of `node` for a given node size.
pub fn node_bounds(node: &Node, size: Size) -> Rect {
    Rect::from_origin_size(node.position, size)
}

pub fn node_center(node: &Node, size: Size) -> Point {
    node_bounds(node, size).center()
}

/// Point on the boundary of a `shape` filling `bounds` where a ray from the
/// centre towards `target` leaves the shape.
///
/// Only the direction of `target` matters, so targets inside the footprint
/// (overlapping nodes) are not special-cased.
pub fn connector_point(shape: ShapeKind, bounds: Rect, target: Point) -> Point {
    let center = bounds.center();
    let delta = target - center;
    if delta.x.abs() < CENTER_EPSILON && delta.y.abs() < CENTER_EPSILON {
        return center;
    }

    let half_w = bounds.width() / 2.0;
    let half_h = bounds.height() / 2.0;
    let factor = match shape {
        ShapeKind::Rectangle => rectangle_factor(delta, half_w, half_h),
        ShapeKind::Ellipse => ellipse_factor(delta, half_w, half_h),
        ShapeKind::DecisionDiamond => diamond_factor(delta, half_w, half_h),
    };
    center + delta * factor
}

fn rectangle_factor(delta: Vec2, half_w: f64, half_h: f64) -> f64 {
    1.0 / (delta.x.abs() / half_w).max(delta.y.abs() / half_h)
}

fn ellipse_factor(delta: Vec2, half_w: f64, half_h: f64) -> f64 {
    let denominator = ((delta.x * delta.x) / (half_w * half_w) + (delta.y * delta.y) / (half_h * half_h)).sqrt();
    if denominator < DENOMINATOR_EPSILON { 1.0 } else { 1.0 / denominator }
}

fn diamond_factor(delta: Vec2, half_w: f64, half_h: f64) -> f64 {
    let denominator = delta.x.abs() / half_w + delta.y.abs() / half_h;
    if denominator < DENOMINATOR_EPSILON { 1.0 } else { 1.0 / denominator }
}

/// Connector point of `node` towards `target`.
pub fn node_connector_point(node: &Node, size: Size, target: Point) -> Point {
    connector_point(node.shape, node_bounds(node, size), target)
}

/// Outline of a node shape filling `bounds`.
pub fn node_outline(shape: ShapeKind, bounds: Rect) -> BezPath {
    match shape {
        ShapeKind::Rectangle => bounds.to_path(0.1),
        ShapeKind::Ellipse => Ellipse::from_rect(bounds).to_path(0.1),
        ShapeKind::DecisionDiamond => {
            let center = bounds.center();
            let mut path = BezPath::new();
            path.move_to(Point::new(center.x, bounds.y0));
            path.line_to(Point::new(bounds.x1, center.y));
            path.line_to(Point::new(center.x, bounds.y1));
            path.line_to(Point::new(bounds.x0, center.y));
            path.close_path();
            path
        }
    }
}

/// Rendering quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTier {
    /// Straight edges, no decoration.
    Lightweight,
    /// Curved edges with shadows and other effects.
    #[default]
    Full,
}

/// Per-frame drawing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    pub tier: RenderTier,
    pub draw_arrows: bool,
    pub draw_shadows: bool,
}

impl RenderPlan {
    pub fn is_lightweight(&self) -> bool {
        self.tier == RenderTier::Lightweight
    }

    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self.tier {
            RenderTier::Lightweight => "Lite",
            RenderTier::Full => "Full",
        }
    }
}

impl RenderThresholds {
    /// Decide how to draw a graph of the given size.
    pub fn plan(&self, node_count: usize, edge_count: usize, dragging: bool) -> RenderPlan {
        let lightweight = dragging || node_count > self.max_full_nodes || edge_count > self.max_full_edges;
        if lightweight {
            RenderPlan {
                tier: RenderTier::Lightweight,
                draw_arrows: edge_count < self.arrow_suppress_edges,
                draw_shadows: false,
            }
        } else {
            RenderPlan {
                tier: RenderTier::Full,
                draw_arrows: true,
                draw_shadows: true,
            }
        }
    }
}

/// Geometry of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCurve {
    Straight(Line),
    Cubic(CubicBez),
}

impl EdgeCurve {
    /// Build the curve between two connector points for `tier`.
    pub fn between(start: Point, end: Point, tier: RenderTier) -> Self {
        match tier {
            RenderTier::Lightweight => EdgeCurve::Straight(Line::new(start, end)),
            RenderTier::Full => {
                let offset = MIN_CONTROL_OFFSET.max((end.x - start.x).abs() * CONTROL_OFFSET_RATIO);
                let c1 = Point::new(start.x + offset, start.y);
                let c2 = Point::new(end.x - offset, end.y);
                EdgeCurve::Cubic(CubicBez::new(start, c1, c2, end))
            }
        }
    }

    pub fn start(&self) -> Point {
        match self {
            EdgeCurve::Straight(line) => line.p0,
            EdgeCurve::Cubic(cubic) => cubic.p0,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            EdgeCurve::Straight(line) => line.p1,
            EdgeCurve::Cubic(cubic) => cubic.p3,
        }
    }

    /// Direction the curve arrives at its end point (not normalized).
    pub fn end_tangent(&self) -> Vec2 {
        match self {
            EdgeCurve::Straight(line) => line.p1 - line.p0,
            EdgeCurve::Cubic(cubic) => cubic.p3 - cubic.p2,
        }
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        match self {
            EdgeCurve::Straight(line) => {
                path.move_to(line.p0);
                path.line_to(line.p1);
            }
            EdgeCurve::Cubic(cubic) => {
                path.move_to(cubic.p0);
                path.curve_to(cubic.p1, cubic.p2, cubic.p3);
            }
        }
        path
    }
}

/// Edge curve from `from` to `to`, each end clipped to its node's shape.
pub fn edge_curve(from: &Node, to: &Node, size: Size, tier: RenderTier) -> EdgeCurve {
    let from_center = node_center(from, size);
    let to_center = node_center(to, size);
    let start = node_connector_point(from, size, to_center);
    let end = node_connector_point(to, size, from_center);
    EdgeCurve::between(start, end, tier)
}

/// Filled triangle at the end of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

impl ArrowHead {
    /// Arrowhead with its tip at `tip`, pointing along `tangent`.
    pub fn new(tip: Point, tangent: Vec2) -> Self {
        let tangent = if tangent.hypot2() < TANGENT_EPSILON {
            Vec2::new(1.0, 0.0)
        } else {
            tangent / tangent.hypot()
        };
        let perp = Vec2::new(-tangent.y, tangent.x);
        let back = tip - tangent * ARROW_SIZE;
        let spread = perp * (ARROW_SIZE * ARROW_SPREAD);
        Self {
            tip,
            left: back + spread,
            right: back - spread,
        }
    }

    pub fn points(&self) -> [Point; 3] {
        [self.tip, self.left, self.right]
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.tip);
        path.line_to(self.left);
        path.line_to(self.right);
        path.close_path();
        path
    }
}

/// Everything a renderer needs to draw one edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    pub from_id: NodeId,
    pub to_id: NodeId,
    pub curve: EdgeCurve,
    pub arrow: Option<ArrowHead>,
}

/// Geometry for every edge of `store`, in edge insertion order.
pub fn edge_geometry(store: &GraphStore, size: Size, plan: RenderPlan) -> Vec<EdgeGeometry> {
    store
        .edges()
        .iter()
        .filter_map(|edge| {
            let from = store.find_node(&edge.from_id)?;
            let to = store.find_node(&edge.to_id)?;
            let curve = edge_curve(from, to, size, plan.tier);
            let arrow = plan
                .draw_arrows
                .then(|| ArrowHead::new(curve.end(), curve.end_tangent()));
            Some(EdgeGeometry {
                from_id: edge.from_id.clone(),
                to_id: edge.to_id.clone(),
                curve,
                arrow,
            })
        })
        .collect()
}
