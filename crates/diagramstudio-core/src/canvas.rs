//! Editing session: graph, workspace, history and theme wired together.

use crate::config::EditorConfig;
use crate::geometry::{EdgeGeometry, RenderPlan, edge_geometry};
use crate::graph::{DEFAULT_NODE_TITLE, GraphStore, Node, NodeId, ShapeKind, ids_equal, normalize_description};
use crate::history::HistoryManager;
use crate::layout::GridLayout;
use crate::project::{DEFAULT_THEME_KEY, ProjectState};
use crate::snap::snap_to_grid;
use crate::workspace::WorkspaceSizer;
use kurbo::{Point, Rect, Vec2};

/// Theme keys understood by the editor. The first one is the fallback.
pub const THEME_KEYS: [&str; 3] = [DEFAULT_THEME_KEY, "Forest", "Sunset"];

/// Canonical spelling of a theme key; unknown keys fall back to the default.
pub fn resolve_theme_key(key: &str) -> &'static str {
    THEME_KEYS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(key.trim()))
        .copied()
        .unwrap_or(DEFAULT_THEME_KEY)
}

/// Base paste offset from the source node.
const PASTE_OFFSET: f64 = 36.0;
/// Extra offset per consecutive paste.
const PASTE_OFFSET_STEP: f64 = 12.0;
const COPY_SUFFIX: &str = " Copy";

/// Moves smaller than this are ignored while dragging.
const DRAG_EPSILON: f64 = 0.1;

/// Distance kept from the viewport edge when placing new nodes.
const VIEWPORT_INSET: f64 = 20.0;
/// Offsets cycled through by [`Canvas::next_node_position`], in steps.
const PLACEMENT_OFFSETS: [(f64, f64); 9] = [
    (0.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
];
const PLACEMENT_STEP_X: f64 = 32.0;
const PLACEMENT_STEP_Y: f64 = 26.0;

/// A node copied for pasting.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardNode {
    pub title: String,
    pub description: String,
    pub shape: ShapeKind,
    pub position: Point,
}

impl From<&Node> for ClipboardNode {
    fn from(node: &Node) -> Self {
        Self {
            title: node.title.clone(),
            description: node.description.clone(),
            shape: node.shape,
            position: node.position,
        }
    }
}

/// An in-progress pointer drag.
#[derive(Debug, Clone, PartialEq)]
struct DragState {
    node_id: NodeId,
    /// Pointer position relative to the node's top-left corner.
    offset: Vec2,
    moved: bool,
}

/// A diagram being edited.
///
/// Every mutating operation that changes the diagram ends with a history
/// checkpoint, so undo and dirty tracking always see the latest state.
#[derive(Debug, Clone)]
pub struct Canvas {
    graph: GraphStore,
    workspace: WorkspaceSizer,
    history: HistoryManager,
    config: EditorConfig,
    theme_key: String,
    snap_enabled: bool,
    selected: Option<NodeId>,
    drag: Option<DragState>,
    clipboard: Option<ClipboardNode>,
    paste_offset_step: u32,
    /// Signature of the last saved state; `None` until first saved.
    saved_signature: Option<String>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    /// Create an empty, clean session.
    pub fn new(config: EditorConfig) -> Self {
        let mut canvas = Self {
            graph: GraphStore::new(),
            workspace: WorkspaceSizer::new(config.workspace.clone()),
            history: HistoryManager::with_capacity(config.history_capacity),
            config,
            theme_key: DEFAULT_THEME_KEY.to_string(),
            snap_enabled: true,
            selected: None,
            drag: None,
            clipboard: None,
            paste_offset_step: 0,
            saved_signature: None,
        };
        canvas.reset_history();
        canvas.mark_saved();
        canvas
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn workspace(&self) -> &WorkspaceSizer {
        &self.workspace
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn theme_key(&self) -> &str {
        &self.theme_key
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    /// Toggle grid snapping. Affects future placements only.
    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    fn snap_grid(&self) -> Option<f64> {
        self.snap_enabled.then_some(self.config.grid_size)
    }

    fn snap(&self, point: Point) -> Point {
        match self.snap_grid() {
            Some(grid) => snap_to_grid(point, grid),
            None => point,
        }
    }

    fn clamp_to_minimum(&self, point: Point) -> Point {
        let min = self.config.workspace.min_node_coordinate;
        Point::new(point.x.max(min), point.y.max(min))
    }

    // --- Selection ---

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.as_deref().and_then(|id| self.graph.find_node(id))
    }

    /// Select a node, or clear the selection with `None`. Returns false if
    /// the node does not exist.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) => match self.graph.find_node(id) {
                Some(node) => {
                    self.selected = Some(node.id().to_string());
                    true
                }
                None => false,
            },
        }
    }

    fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref().is_some_and(|s| ids_equal(s, id))
    }

    // --- Snapshots and history ---

    /// Deep copy of the current diagram including workspace size and theme.
    pub fn capture_state(&self) -> ProjectState {
        let mut state = self.graph.export_snapshot(&self.theme_key);
        state.canvas_width = self.workspace.width();
        state.canvas_height = self.workspace.height();
        state
    }

    /// Replace the session's diagram with `state` without touching history.
    pub fn apply_snapshot(&mut self, state: &ProjectState) {
        self.workspace.set_size(state.canvas_width, state.canvas_height);
        self.graph.import_snapshot(state);

        let node_size = self.config.node_size();
        let snap_grid = self.snap_grid();
        for node in self.graph.nodes_mut() {
            self.workspace.normalize_node(node, node_size, snap_grid);
        }

        self.theme_key = resolve_theme_key(&state.theme_key).to_string();
        self.drag = None;
        if self
            .selected
            .as_deref()
            .is_some_and(|id| self.graph.find_node(id).is_none())
        {
            self.selected = None;
        }
    }

    /// Record the current state as a history checkpoint.
    /// Returns false if it matches the current entry.
    ///
    /// Auto-save sees commits through [`is_dirty`](Self::is_dirty) when driven by
    /// [`AutoSaveManager::tick_canvas`](crate::storage::AutoSaveManager::tick_canvas).
    /// Callers ticking with a bare [`ProjectState`] must call `mark_dirty` themselves.
    pub fn commit(&mut self) -> bool {
        let state = self.capture_state();
        let pushed = self.history.push_state(&state, false);
        log::debug!(
            "Commit: {} nodes, {} edges (pushed: {}, dirty: {})",
            self.graph.node_count(),
            self.graph.edge_count(),
            pushed,
            self.is_dirty()
        );
        pushed
    }

    fn reset_history(&mut self) {
        let state = self.capture_state();
        self.history.initialize_from(&state);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous checkpoint. Returns false at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                self.apply_snapshot(&state);
                true
            }
            None => false,
        }
    }

    /// Restore the next checkpoint. Returns false at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                self.apply_snapshot(&state);
                true
            }
            None => false,
        }
    }

    // --- Dirty tracking ---

    /// Whether the diagram differs from the last saved state.
    pub fn is_dirty(&self) -> bool {
        match &self.saved_signature {
            Some(saved) => *saved != self.capture_state().signature(),
            None => true,
        }
    }

    /// Treat the current state as saved.
    pub fn mark_saved(&mut self) {
        self.saved_signature = Some(self.capture_state().signature());
    }

    /// Start over with an empty diagram, keeping the theme.
    pub fn new_project(&mut self) {
        self.graph.clear();
        self.workspace.reset();
        self.selected = None;
        self.drag = None;
        self.reset_history();
        self.mark_saved();
        log::info!("New project created");
    }

    /// Open `state` as a fresh, clean session.
    pub fn load_project(&mut self, state: &ProjectState) {
        self.apply_snapshot(state);
        self.reset_history();
        self.mark_saved();
        log::info!(
            "Project loaded: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    // --- Editing ---

    fn normalize(&mut self, id: &str) {
        let node_size = self.config.node_size();
        let snap_grid = self.snap_grid();
        if let Some(node) = self.graph.find_node_mut(id) {
            self.workspace.normalize_node(node, node_size, snap_grid);
        }
    }

    /// Add a node at `position` and select it. Blank titles become
    /// [`DEFAULT_NODE_TITLE`].
    pub fn add_node(&mut self, title: &str, description: Option<&str>, shape: ShapeKind, position: Point) -> NodeId {
        let title = match title.trim() {
            "" => DEFAULT_NODE_TITLE,
            trimmed => trimmed,
        };
        let id = self.graph.add_node(title, position, shape, description).id().to_string();
        self.normalize(&id);
        self.selected = Some(id.clone());
        self.commit();
        id
    }

    /// Add a node of `shape` centred on `pointer`, titled after its shape.
    pub fn add_node_from_shape(&mut self, shape: ShapeKind, pointer: Point) -> NodeId {
        let size = self.config.node_size();
        let top_left = self.clamp_to_minimum(pointer - Vec2::new(size.width / 2.0, size.height / 2.0));
        let position = self.snap(top_left);
        self.add_node(shape.default_title(), None, shape, position)
    }

    /// Update a node's title and description. A blank title keeps the old
    /// one. Returns false if the node is missing or nothing changed.
    pub fn rename_node(&mut self, id: &str, title: &str, description: Option<&str>) -> bool {
        let Some(node) = self.graph.find_node(id) else {
            return false;
        };
        let title = match title.trim() {
            "" => node.title.clone(),
            trimmed => trimmed.to_string(),
        };
        let description = normalize_description(description);
        if !self.graph.rename_node(id, &title, Some(&description)) {
            return false;
        }
        self.commit();
        true
    }

    /// Change only the title, keeping the description.
    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        let Some(description) = self.graph.find_node(id).map(|n| n.description.clone()) else {
            return false;
        };
        self.rename_node(id, title, Some(&description))
    }

    /// Delete a node and its edges.
    pub fn delete_node(&mut self, id: &str) -> bool {
        if !self.graph.remove_node(id) {
            return false;
        }
        if self.is_selected(id) {
            self.selected = None;
        }
        if self.drag.as_ref().is_some_and(|d| ids_equal(&d.node_id, id)) {
            self.drag = None;
        }
        self.commit();
        true
    }

    pub fn connect(&mut self, from_id: &str, to_id: &str) -> bool {
        if !self.graph.connect(from_id, to_id) {
            return false;
        }
        self.commit();
        true
    }

    pub fn remove_edge(&mut self, from_id: &str, to_id: &str) -> bool {
        if !self.graph.remove_edge(from_id, to_id) {
            return false;
        }
        self.commit();
        true
    }

    /// Arrange all nodes on a grid in id order. Returns the number of nodes
    /// placed; an empty diagram is left alone.
    pub fn auto_layout(&mut self) -> usize {
        if self.graph.is_empty() {
            return 0;
        }
        let node_size = self.config.node_size();
        let snap_grid = self.snap_grid();
        let placed = GridLayout::new(node_size, &self.config.layout)
            .with_snap(snap_grid)
            .apply(&mut self.graph);
        for node in self.graph.nodes_mut() {
            self.workspace.normalize_node(node, node_size, snap_grid);
        }
        self.commit();
        placed
    }

    /// Remove every node and shrink the workspace back to its minimum.
    /// Returns false if the diagram was already empty.
    pub fn clear(&mut self) -> bool {
        if self.graph.is_empty() {
            return false;
        }
        self.graph.clear();
        self.workspace.reset();
        self.selected = None;
        self.drag = None;
        self.commit();
        true
    }

    /// Switch theme. Unknown keys select the default theme.
    pub fn set_theme(&mut self, key: &str) -> bool {
        let key = resolve_theme_key(key);
        if self.theme_key == key {
            return false;
        }
        self.theme_key = key.to_string();
        self.commit();
        true
    }

    // --- Dragging ---

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging `id` with the pointer at `pointer`. Selects the node.
    pub fn begin_drag(&mut self, id: &str, pointer: Point) -> bool {
        let Some(node) = self.graph.find_node(id) else {
            return false;
        };
        let node_id = node.id().to_string();
        self.drag = Some(DragState {
            offset: pointer - node.position,
            node_id: node_id.clone(),
            moved: false,
        });
        self.selected = Some(node_id);
        true
    }

    /// Follow the pointer. Returns true if the node moved.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let target = self.snap(self.clamp_to_minimum(pointer - drag.offset));
        let node_id = drag.node_id.clone();

        let Some(node) = self.graph.find_node(&node_id) else {
            self.drag = None;
            return false;
        };
        if (target.x - node.x()).abs() < DRAG_EPSILON && (target.y - node.y()).abs() < DRAG_EPSILON {
            return false;
        }

        self.graph.move_node(&node_id, target);
        self.normalize(&node_id);
        if let Some(drag) = &mut self.drag {
            drag.moved = true;
        }
        true
    }

    /// Finish the drag, committing if the node moved.
    pub fn end_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(drag) if drag.moved => {
                self.commit();
                true
            }
            _ => false,
        }
    }

    // --- Clipboard ---

    pub fn clipboard(&self) -> Option<&ClipboardNode> {
        self.clipboard.as_ref()
    }

    /// Copy a node to the clipboard and restart the paste offset.
    pub fn copy_node(&mut self, id: &str) -> bool {
        let Some(node) = self.graph.find_node(id) else {
            return false;
        };
        self.clipboard = Some(ClipboardNode::from(node));
        self.paste_offset_step = 0;
        true
    }

    /// Paste the clipboard next to the selected node, or next to the copied
    /// position when nothing is selected. Each paste moves further away.
    pub fn paste(&mut self) -> Option<NodeId> {
        let clipboard = self.clipboard.clone()?;
        self.paste_offset_step += 1;
        let offset = PASTE_OFFSET + f64::from(self.paste_offset_step) * PASTE_OFFSET_STEP;

        let anchor = self.selected_node().map_or(clipboard.position, |node| node.position);
        let position = self.clamp_to_minimum(self.snap(anchor + Vec2::new(offset, offset)));
        let title = format!("{}{}", clipboard.title, COPY_SUFFIX);
        let description = (!clipboard.description.is_empty()).then_some(clipboard.description.as_str());
        Some(self.add_node(&title, description, clipboard.shape, position))
    }

    /// Copy and immediately paste `id`.
    pub fn duplicate(&mut self, id: &str) -> Option<NodeId> {
        if !self.copy_node(id) || !self.select(Some(id)) {
            return None;
        }
        self.paste()
    }

    // --- Placement and rendering ---

    /// Where a new node goes inside the visible `viewport`: near its centre,
    /// nudged by an offset that cycles with the node count.
    pub fn next_node_position(&self, viewport: Rect) -> Point {
        let size = self.config.node_size();
        let edge = self.config.workspace.min_node_coordinate;
        let min_x = edge.max(viewport.x0 + VIEWPORT_INSET);
        let min_y = edge.max(viewport.y0 + VIEWPORT_INSET);
        let max_x = min_x.max((self.workspace.width() - size.width - edge).min(viewport.x1 - size.width - VIEWPORT_INSET));
        let max_y = min_y.max((self.workspace.height() - size.height - edge).min(viewport.y1 - size.height - VIEWPORT_INSET));

        let center = Point::new(min_x + (max_x - min_x) / 2.0, min_y + (max_y - min_y) / 2.0);
        let (dx, dy) = PLACEMENT_OFFSETS[self.graph.node_count() % PLACEMENT_OFFSETS.len()];
        let position = self.snap(center + Vec2::new(dx * PLACEMENT_STEP_X, dy * PLACEMENT_STEP_Y));
        Point::new(position.x.clamp(min_x, max_x), position.y.clamp(min_y, max_y))
    }

    /// Rendering tier for the current diagram size and drag state.
    pub fn render_plan(&self) -> RenderPlan {
        self.config
            .render
            .plan(self.graph.node_count(), self.graph.edge_count(), self.is_dragging())
    }

    /// Curves and arrowheads for every edge under the current render plan.
    pub fn edge_geometry(&self) -> Vec<EdgeGeometry> {
        edge_geometry(&self.graph, self.config.node_size(), self.render_plan())
    }

    /// Export area around all nodes, `None` when the diagram is empty.
    pub fn diagram_bounds(&self) -> Option<Rect> {
        self.workspace.diagram_bounds(self.graph.nodes(), self.config.node_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RenderTier;
    use kurbo::Size;

    fn canvas() -> Canvas {
        Canvas::default()
    }

    fn unsnapped() -> Canvas {
        let mut canvas = Canvas::default();
        canvas.set_snap_enabled(false);
        canvas
    }

    #[test]
    fn test_new_canvas_is_clean() {
        let canvas = canvas();
        assert!(canvas.graph().is_empty());
        assert!(!canvas.is_dirty());
        assert!(!canvas.can_undo());
        assert!(!canvas.can_redo());
        assert_eq!(canvas.theme_key(), "Ocean");
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn test_resolve_theme_key() {
        assert_eq!(resolve_theme_key("forest"), "Forest");
        assert_eq!(resolve_theme_key(" SUNSET "), "Sunset");
        assert_eq!(resolve_theme_key("Neon"), "Ocean");
    }

    #[test]
    fn test_add_node_commits_and_selects() {
        let mut canvas = unsnapped();
        let id = canvas.add_node("  Start ", Some(" first "), ShapeKind::Ellipse, Point::new(100.0, 120.0));
        assert_eq!(id, "N1");
        assert_eq!(canvas.selected(), Some("N1"));

        let node = canvas.graph().find_node(&id).unwrap();
        assert_eq!(node.title, "Start");
        assert_eq!(node.description, "first");
        assert_eq!(node.position, Point::new(100.0, 120.0));
        assert!(canvas.is_dirty());
        assert!(canvas.can_undo());
    }

    #[test]
    fn test_add_node_blank_title_and_clamp() {
        let mut canvas = unsnapped();
        let id = canvas.add_node("   ", None, ShapeKind::Rectangle, Point::new(-50.0, 3.0));
        let node = canvas.graph().find_node(&id).unwrap();
        assert_eq!(node.title, DEFAULT_NODE_TITLE);
        assert_eq!(node.position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_add_node_snaps_when_enabled() {
        let mut canvas = canvas();
        let id = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(101.0, 130.0));
        assert_eq!(canvas.graph().find_node(&id).unwrap().position, Point::new(96.0, 120.0));
    }

    #[test]
    fn test_add_node_from_shape_centres_on_pointer() {
        let mut canvas = unsnapped();
        let id = canvas.add_node_from_shape(ShapeKind::DecisionDiamond, Point::new(500.0, 400.0));
        let node = canvas.graph().find_node(&id).unwrap();
        assert_eq!(node.title, "Decision Node");
        assert_eq!(node.position, Point::new(415.0, 354.0));
    }

    #[test]
    fn test_add_node_grows_workspace() {
        let mut canvas = unsnapped();
        canvas.add_node("Far", None, ShapeKind::Rectangle, Point::new(2400.0, 100.0));
        assert_eq!(canvas.workspace().width(), 3700.0);
        assert_eq!(canvas.capture_state().canvas_width, 3700.0);
    }

    #[test]
    fn test_undo_redo_add_node() {
        let mut canvas = canvas();
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(240.0, 48.0));
        assert_eq!(canvas.graph().node_count(), 2);

        assert!(canvas.undo());
        assert_eq!(canvas.graph().node_count(), 1);
        assert!(canvas.can_redo());

        assert!(canvas.undo());
        assert!(canvas.graph().is_empty());
        assert!(!canvas.undo());

        assert!(canvas.redo());
        assert!(canvas.redo());
        assert_eq!(canvas.graph().node_count(), 2);
        assert!(!canvas.redo());
    }

    #[test]
    fn test_undo_drops_stale_selection() {
        let mut canvas = canvas();
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        assert_eq!(canvas.selected(), Some("N1"));
        canvas.undo();
        assert_eq!(canvas.selected(), None);
    }

    #[test]
    fn test_undo_clears_redo() {
        let mut canvas = canvas();
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(240.0, 48.0));
        canvas.undo();
        canvas.add_node("C", None, ShapeKind::Ellipse, Point::new(480.0, 48.0));
        assert!(!canvas.can_redo());
        let titles: Vec<&str> = canvas.graph().nodes().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_rename_node() {
        let mut canvas = canvas();
        let id = canvas.add_node("A", Some("desc"), ShapeKind::Rectangle, Point::new(48.0, 48.0));
        let entries = canvas.history().len();

        assert!(!canvas.rename_node(&id, "A", Some("desc")));
        assert!(!canvas.rename_node(&id, "   ", Some(" desc ")));
        assert_eq!(canvas.history().len(), entries);

        assert!(canvas.rename_node(&id, "  ", Some("other")));
        let node = canvas.graph().find_node(&id).unwrap();
        assert_eq!(node.title, "A");
        assert_eq!(node.description, "other");

        assert!(canvas.set_title(&id, "Renamed"));
        let node = canvas.graph().find_node(&id).unwrap();
        assert_eq!(node.title, "Renamed");
        assert_eq!(node.description, "other");
        assert!(!canvas.rename_node("N99", "X", None));
    }

    #[test]
    fn test_delete_node_cascades_and_clears_selection() {
        let mut canvas = canvas();
        let a = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        let b = canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(240.0, 48.0));
        assert!(canvas.connect(&a, &b));
        assert_eq!(canvas.selected(), Some(b.as_str()));

        assert!(canvas.delete_node(&b));
        assert_eq!(canvas.graph().edge_count(), 0);
        assert_eq!(canvas.selected(), None);
        assert!(!canvas.delete_node(&b));
    }

    #[test]
    fn test_connect_and_remove_edge_commit() {
        let mut canvas = canvas();
        let a = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        let b = canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(240.0, 48.0));
        let entries = canvas.history().len();

        assert!(canvas.connect(&a, &b));
        assert!(!canvas.connect(&a, &b));
        assert!(!canvas.connect(&a, &a));
        assert_eq!(canvas.history().len(), entries + 1);

        assert!(canvas.remove_edge("n1", "N2"));
        assert!(!canvas.remove_edge(&a, &b));
        assert_eq!(canvas.history().len(), entries + 2);
    }

    #[test]
    fn test_auto_layout() {
        let mut canvas = unsnapped();
        assert_eq!(canvas.auto_layout(), 0);
        for i in 0..4 {
            canvas.add_node(&format!("Node {}", i), None, ShapeKind::Rectangle, Point::new(900.0, 900.0));
        }
        assert_eq!(canvas.auto_layout(), 4);
        let positions: Vec<Point> = canvas.graph().nodes().map(|n| n.position).collect();
        assert_eq!(
            positions,
            vec![
                Point::new(80.0, 80.0),
                Point::new(334.0, 80.0),
                Point::new(80.0, 254.0),
                Point::new(334.0, 254.0),
            ]
        );
        assert!(canvas.undo());
        assert!(canvas.graph().nodes().all(|n| n.position == Point::new(900.0, 900.0)));
    }

    #[test]
    fn test_clear_resets_workspace() {
        let mut canvas = unsnapped();
        assert!(!canvas.clear());
        canvas.add_node("Far", None, ShapeKind::Rectangle, Point::new(4000.0, 3000.0));
        assert!(canvas.workspace().width() > 2500.0);

        assert!(canvas.clear());
        assert!(canvas.graph().is_empty());
        assert_eq!(canvas.workspace().size(), Size::new(2500.0, 1600.0));

        // Ids restart after clearing.
        let id = canvas.add_node("Again", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        assert_eq!(id, "N1");
    }

    #[test]
    fn test_set_theme() {
        let mut canvas = canvas();
        assert!(!canvas.set_theme("ocean"));
        assert!(canvas.set_theme("forest"));
        assert_eq!(canvas.theme_key(), "Forest");
        assert!(canvas.is_dirty());
        assert!(canvas.undo());
        assert_eq!(canvas.theme_key(), "Ocean");
    }

    #[test]
    fn test_drag_moves_snaps_and_commits_once() {
        let mut canvas = canvas();
        let id = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(96.0, 96.0));
        let entries = canvas.history().len();

        assert!(canvas.begin_drag(&id, Point::new(100.0, 100.0)));
        assert!(canvas.is_dragging());
        assert!(canvas.render_plan().is_lightweight());

        // Offset (4, 4): pointer 150,130 -> 146,126 -> snapped 144,120.
        assert!(canvas.drag_to(Point::new(150.0, 130.0)));
        assert_eq!(canvas.graph().find_node(&id).unwrap().position, Point::new(144.0, 120.0));
        // Same snapped cell: ignored.
        assert!(!canvas.drag_to(Point::new(151.0, 131.0)));
        assert!(canvas.drag_to(Point::new(200.0, 200.0)));
        assert_eq!(canvas.history().len(), entries);

        assert!(canvas.end_drag());
        assert!(!canvas.is_dragging());
        assert_eq!(canvas.history().len(), entries + 1);
        assert!(canvas.undo());
        assert_eq!(canvas.graph().find_node(&id).unwrap().position, Point::new(96.0, 96.0));
    }

    #[test]
    fn test_drag_without_movement_does_not_commit() {
        let mut canvas = canvas();
        let id = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(96.0, 96.0));
        let entries = canvas.history().len();
        canvas.begin_drag(&id, Point::new(100.0, 100.0));
        assert!(!canvas.drag_to(Point::new(100.05, 100.0)));
        assert!(!canvas.end_drag());
        assert_eq!(canvas.history().len(), entries);
        assert!(!canvas.begin_drag("N42", Point::ZERO));
        assert!(!canvas.drag_to(Point::new(300.0, 300.0)));
    }

    #[test]
    fn test_drag_clamps_to_minimum_coordinate() {
        let mut canvas = unsnapped();
        let id = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(50.0, 50.0));
        canvas.begin_drag(&id, Point::new(60.0, 60.0));
        assert!(canvas.drag_to(Point::new(-100.0, 5.0)));
        assert_eq!(canvas.graph().find_node(&id).unwrap().position, Point::new(10.0, 10.0));
        canvas.end_drag();
    }

    #[test]
    fn test_copy_paste_offsets_accumulate() {
        let mut canvas = unsnapped();
        let id = canvas.add_node("A", Some("body"), ShapeKind::Ellipse, Point::new(100.0, 100.0));
        assert!(canvas.copy_node(&id));
        canvas.select(None);

        let first = canvas.paste().unwrap();
        let node = canvas.graph().find_node(&first).unwrap();
        assert_eq!(node.title, "A Copy");
        assert_eq!(node.description, "body");
        assert_eq!(node.shape, ShapeKind::Ellipse);
        assert_eq!(node.position, Point::new(148.0, 148.0));

        // The pasted node is selected, so the next paste is relative to it.
        let second = canvas.paste().unwrap();
        assert_eq!(canvas.graph().find_node(&second).unwrap().position, Point::new(208.0, 208.0));

        // Copying again restarts the step.
        canvas.copy_node(&id);
        canvas.select(None);
        let third = canvas.paste().unwrap();
        assert_eq!(canvas.graph().find_node(&third).unwrap().position, Point::new(148.0, 148.0));
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let mut canvas = canvas();
        assert!(canvas.paste().is_none());
        assert!(!canvas.copy_node("N1"));
    }

    #[test]
    fn test_duplicate() {
        let mut canvas = unsnapped();
        let a = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(100.0, 100.0));
        canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(600.0, 600.0));

        let copy = canvas.duplicate(&a).unwrap();
        assert_eq!(copy, "N3");
        assert_eq!(canvas.selected(), Some("N3"));
        assert_eq!(canvas.graph().find_node(&copy).unwrap().position, Point::new(148.0, 148.0));
        assert!(canvas.duplicate("missing").is_none());
    }

    #[test]
    fn test_next_node_position_cycles_offsets() {
        let mut canvas = unsnapped();
        let viewport = Rect::new(0.0, 0.0, 1000.0, 800.0);

        // min 20, max 810 x 688 -> centre (415, 354).
        assert_eq!(canvas.next_node_position(viewport), Point::new(415.0, 354.0));
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(10.0, 10.0));
        assert_eq!(canvas.next_node_position(viewport), Point::new(447.0, 354.0));
        canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(10.0, 10.0));
        assert_eq!(canvas.next_node_position(viewport), Point::new(383.0, 354.0));
    }

    #[test]
    fn test_next_node_position_in_tiny_viewport() {
        let canvas = unsnapped();
        let position = canvas.next_node_position(Rect::new(300.0, 300.0, 350.0, 320.0));
        assert_eq!(position, Point::new(320.0, 320.0));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut canvas = canvas();
        let id = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        assert!(canvas.is_dirty());
        canvas.mark_saved();
        assert!(!canvas.is_dirty());

        canvas.rename_node(&id, "B", None);
        assert!(canvas.is_dirty());
        canvas.undo();
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn test_load_project_resets_history() {
        let mut source = unsnapped();
        let a = source.add_node("A", None, ShapeKind::Rectangle, Point::new(50.0, 50.0));
        let b = source.add_node("B", None, ShapeKind::Ellipse, Point::new(300.0, 50.0));
        source.connect(&a, &b);
        source.set_theme("Sunset");
        let state = source.capture_state();

        let mut canvas = unsnapped();
        canvas.add_node("Old", None, ShapeKind::Rectangle, Point::new(50.0, 50.0));
        canvas.load_project(&state);

        assert_eq!(canvas.graph().node_count(), 2);
        assert_eq!(canvas.graph().edge_count(), 1);
        assert_eq!(canvas.theme_key(), "Sunset");
        assert!(!canvas.is_dirty());
        assert!(!canvas.can_undo());
        assert_eq!(canvas.capture_state(), state);
    }

    #[test]
    fn test_apply_snapshot_normalizes() {
        let mut state = ProjectState::default();
        state.canvas_width = 100.0;
        state.theme_key = "unknown".to_string();
        state.nodes.push(crate::project::NodeRecord {
            id: "N7".to_string(),
            x: -20.0,
            y: 2000.0,
            ..Default::default()
        });

        let mut canvas = unsnapped();
        canvas.apply_snapshot(&state);
        let node = canvas.graph().find_node("n7").unwrap();
        assert_eq!(node.position, Point::new(10.0, 2000.0));
        assert_eq!(canvas.workspace().width(), 2500.0);
        assert!(canvas.workspace().height() >= 2000.0 + 92.0 + 260.0);
        assert_eq!(canvas.theme_key(), "Ocean");
    }

    #[test]
    fn test_load_project_with_far_away_node() {
        let mut state = ProjectState::default();
        state.nodes.push(crate::project::NodeRecord {
            id: "N1".to_string(),
            x: 1e30,
            y: 40.0,
            ..Default::default()
        });

        let mut canvas = unsnapped();
        canvas.load_project(&state);
        assert_eq!(canvas.graph().node_count(), 1);
        assert!(canvas.workspace().width() >= 1e30);
        assert_eq!(canvas.workspace().height(), 1600.0);
    }

    #[test]
    fn test_new_project_keeps_theme() {
        let mut canvas = canvas();
        canvas.set_theme("Forest");
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        canvas.new_project();
        assert!(canvas.graph().is_empty());
        assert_eq!(canvas.theme_key(), "Forest");
        assert!(!canvas.is_dirty());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_render_plan_and_edges() {
        let mut canvas = canvas();
        let a = canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(48.0, 48.0));
        let b = canvas.add_node("B", None, ShapeKind::Rectangle, Point::new(480.0, 48.0));
        canvas.connect(&a, &b);

        let plan = canvas.render_plan();
        assert_eq!(plan.tier, RenderTier::Full);
        let edges = canvas.edge_geometry();
        assert_eq!(edges.len(), 1);
        assert!(edges[0].arrow.is_some());
    }

    #[test]
    fn test_diagram_bounds() {
        let mut canvas = unsnapped();
        assert!(canvas.diagram_bounds().is_none());
        canvas.add_node("A", None, ShapeKind::Rectangle, Point::new(100.0, 100.0));
        assert_eq!(canvas.diagram_bounds(), Some(Rect::new(20.0, 20.0, 350.0, 272.0)));
    }
}
