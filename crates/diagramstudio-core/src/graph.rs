//! Graph store: nodes, directed edges and their invariants.
//!
//! Node ids compare case-insensitively everywhere. Internally every id is
//! folded to a canonical key, which also gives nodes a stable, id-sorted
//! iteration order.

use crate::project::{EdgeRecord, NodeRecord, ProjectState};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Identifier of a node (`N1`, `N2`, ... for store-assigned ids).
pub type NodeId = String;

/// Title given to imported nodes that have none.
pub const DEFAULT_NODE_TITLE: &str = "New Node";

/// Visual shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    DecisionDiamond,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [
        ShapeKind::Rectangle,
        ShapeKind::Ellipse,
        ShapeKind::DecisionDiamond,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::DecisionDiamond => "DecisionDiamond",
        }
    }

    /// Parse a shape name, falling back to `Rectangle` for blank or unknown input.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Title used for nodes created from a shape palette.
    pub fn default_title(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle Node",
            ShapeKind::Ellipse => "Ellipse Node",
            ShapeKind::DecisionDiamond => "Decision Node",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for shape names that match no variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown shape type: {0}")]
pub struct UnknownShape(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownShape(s.to_string()))
    }
}

/// A positioned, shaped, labeled graph vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub title: String,
    pub description: String,
    /// Top-left corner of the node footprint.
    pub position: Point,
    pub shape: ShapeKind,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, position: Point, shape: ShapeKind, description: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: normalize_description(description),
            position,
            shape,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }
}

/// A directed connection between two distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from_id: NodeId,
    pub to_id: NodeId,
}

impl Edge {
    pub fn new(from_id: impl Into<NodeId>, to_id: impl Into<NodeId>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
        }
    }

    /// Whether either endpoint is `id`.
    pub fn touches(&self, id: &str) -> bool {
        ids_equal(&self.from_id, id) || ids_equal(&self.to_id, id)
    }

    fn key(&self) -> (String, String) {
        (fold_id(&self.from_id), fold_id(&self.to_id))
    }
}

/// Blank descriptions collapse to empty, others are trimmed.
pub fn normalize_description(description: Option<&str>) -> String {
    description.map(str::trim).unwrap_or_default().to_string()
}

/// Case-insensitive id comparison.
pub fn ids_equal(a: &str, b: &str) -> bool {
    fold_id(a) == fold_id(b)
}

/// Uppercase char by char. Characters whose uppercase form is several chars
/// (`ß`, `ﬁ`) are kept as-is, so distinct ids never fold together.
fn fold_id(id: &str) -> String {
    id.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Numeric suffix of an `N<digits>` id (the `N` is case-insensitive).
fn numeric_suffix(id: &str) -> Option<u64> {
    let rest = id.strip_prefix('N').or_else(|| id.strip_prefix('n'))?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Owner of all nodes and edges.
#[derive(Debug, Clone)]
pub struct GraphStore {
    /// Nodes keyed by folded id.
    nodes: BTreeMap<String, Node>,
    /// Edges in insertion order.
    edges: Vec<Edge>,
    /// Folded (from, to) pairs of `edges`.
    edge_keys: HashSet<(String, String)>,
    next_id: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            next_id: 1,
        }
    }

    /// Add a node with the next free id.
    pub fn add_node(&mut self, title: impl Into<String>, position: Point, shape: ShapeKind, description: Option<&str>) -> &Node {
        let id = self.create_id();
        let key = fold_id(&id);
        let node = Node::new(id, title, position, shape, description);
        self.nodes.entry(key).or_insert(node)
    }

    fn create_id(&mut self) -> NodeId {
        loop {
            let id = format!("N{}", self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&fold_id(&id)) {
                return id;
            }
        }
    }

    /// The counter the next generated id will start from.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Connect `from_id` to `to_id`.
    ///
    /// Returns false for self-loops, unknown endpoints and existing edges.
    pub fn connect(&mut self, from_id: &str, to_id: &str) -> bool {
        if ids_equal(from_id, to_id) {
            return false;
        }
        let (Some(from), Some(to)) = (self.find_node(from_id), self.find_node(to_id)) else {
            return false;
        };
        // Store the canonical ids of the nodes, not the caller's spelling.
        let edge = Edge::new(from.id.clone(), to.id.clone());
        if !self.edge_keys.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn has_edge(&self, from_id: &str, to_id: &str) -> bool {
        self.edge_keys.contains(&(fold_id(from_id), fold_id(to_id)))
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if self.nodes.remove(&fold_id(id)).is_none() {
            return false;
        }
        let edge_keys = &mut self.edge_keys;
        self.edges.retain(|edge| {
            if edge.touches(id) {
                edge_keys.remove(&edge.key());
                false
            } else {
                true
            }
        });
        true
    }

    pub fn remove_edge(&mut self, from_id: &str, to_id: &str) -> bool {
        let key = (fold_id(from_id), fold_id(to_id));
        if !self.edge_keys.remove(&key) {
            return false;
        }
        if let Some(index) = self.edges.iter().position(|edge| edge.key() == key) {
            self.edges.remove(index);
        }
        true
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(&fold_id(id))
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(&fold_id(id))
    }

    /// Update title and description. Returns false if the node is missing or
    /// nothing changed.
    pub fn rename_node(&mut self, id: &str, title: &str, description: Option<&str>) -> bool {
        let Some(node) = self.find_node_mut(id) else {
            return false;
        };
        let description = normalize_description(description);
        if node.title == title && node.description == description {
            return false;
        }
        node.title = title.to_string();
        node.description = description;
        true
    }

    /// Move a node's top-left corner. Returns false if the node is missing.
    pub fn move_node(&mut self, id: &str, position: Point) -> bool {
        match self.find_node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Nodes in id order (ordinal, case-insensitive).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges with `id` on either side.
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.touches(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove everything and restart ids at `N1`.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.edge_keys.clear();
        self.next_id = 1;
    }

    /// Deep copy of the graph, nodes sorted by id. Canvas size fields keep
    /// their defaults; the caller fills them in.
    pub fn export_snapshot(&self, theme_key: &str) -> ProjectState {
        ProjectState {
            theme_key: theme_key.to_string(),
            nodes: self.nodes().map(NodeRecord::from).collect(),
            edges: self
                .edges
                .iter()
                .map(|edge| EdgeRecord {
                    from_id: edge.from_id.clone(),
                    to_id: edge.to_id.clone(),
                })
                .collect(),
            ..ProjectState::default()
        }
    }

    /// Replace all state with `state`, skipping malformed records.
    pub fn import_snapshot(&mut self, state: &ProjectState) {
        self.nodes.clear();
        self.edges.clear();
        self.edge_keys.clear();

        let mut skipped_nodes = 0usize;
        for record in &state.nodes {
            if record.id.trim().is_empty() {
                skipped_nodes += 1;
                continue;
            }
            let key = fold_id(&record.id);
            if self.nodes.contains_key(&key) {
                skipped_nodes += 1;
                continue;
            }
            let node = Node::new(
                record.id.clone(),
                record.title.as_deref().unwrap_or(DEFAULT_NODE_TITLE),
                Point::new(record.x, record.y),
                ShapeKind::parse_lenient(record.shape_type.as_deref()),
                record.description.as_deref(),
            );
            self.nodes.insert(key, node);
        }

        let mut skipped_edges = 0usize;
        for record in &state.edges {
            if record.from_id.trim().is_empty() || record.to_id.trim().is_empty() {
                skipped_edges += 1;
                continue;
            }
            if !self.connect(&record.from_id, &record.to_id) {
                skipped_edges += 1;
            }
        }

        self.next_id = self
            .nodes
            .values()
            .filter_map(|node| numeric_suffix(&node.id))
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        if skipped_nodes > 0 || skipped_edges > 0 {
            log::warn!(
                "Import skipped {} node(s) and {} edge(s) with invalid or duplicate ids",
                skipped_nodes,
                skipped_edges
            );
        }
        log::debug!(
            "Imported {} nodes, {} edges; next id N{}",
            self.nodes.len(),
            self.edges.len(),
            self.next_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{EdgeRecord, NodeRecord};

    fn store_with(n: usize) -> GraphStore {
        let mut store = GraphStore::new();
        for i in 0..n {
            store.add_node(format!("Node {i}"), Point::new(i as f64 * 10.0, 0.0), ShapeKind::Rectangle, None);
        }
        store
    }

    fn node_record(id: &str) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            ..NodeRecord::default()
        }
    }

    fn edge_record(from: &str, to: &str) -> EdgeRecord {
        EdgeRecord {
            from_id: from.to_string(),
            to_id: to.to_string(),
        }
    }

    fn assert_no_dangling_edges(store: &GraphStore) {
        for edge in store.edges() {
            assert!(store.find_node(&edge.from_id).is_some(), "dangling source {}", edge.from_id);
            assert!(store.find_node(&edge.to_id).is_some(), "dangling target {}", edge.to_id);
            assert!(!ids_equal(&edge.from_id, &edge.to_id));
        }
    }

    #[test]
    fn test_add_node_assigns_sequential_ids() {
        let mut store = GraphStore::new();
        let first = store.add_node("A", Point::ZERO, ShapeKind::Rectangle, None).id().to_string();
        let second = store.add_node("B", Point::ZERO, ShapeKind::Ellipse, Some("  note  ")).id().to_string();
        assert_eq!(first, "N1");
        assert_eq!(second, "N2");
        assert_eq!(store.find_node("n2").unwrap().description, "note");
    }

    #[test]
    fn test_ids_never_reused_after_removal() {
        let mut store = store_with(3);
        assert!(store.remove_node("N3"));
        let id = store.add_node("D", Point::ZERO, ShapeKind::Rectangle, None).id().to_string();
        assert_eq!(id, "N4");

        let ids: HashSet<String> = store.nodes().map(|n| n.id().to_uppercase()).collect();
        assert_eq!(ids.len(), store.node_count());
    }

    #[test]
    fn test_connect_rejections() {
        let mut store = store_with(2);
        assert!(!store.connect("N1", "N1"));
        assert!(!store.connect("N1", "n1"));
        assert!(!store.connect("N1", "N9"));
        assert!(store.connect("N1", "N2"));
        assert!(!store.connect("n1", "N2"));
        // Reverse direction is a distinct edge.
        assert!(store.connect("N2", "N1"));
        assert_eq!(store.edge_count(), 2);
        assert!(store.has_edge("n1", "n2"));
        assert!(!store.has_edge("N1", "N3"));
    }

    #[test]
    fn test_connect_stores_canonical_ids() {
        let mut store = store_with(2);
        assert!(store.connect("n1", "n2"));
        assert_eq!(store.edges()[0], Edge::new("N1", "N2"));
    }

    #[test]
    fn test_remove_node_cascades_only_incident_edges() {
        let mut store = store_with(4);
        store.connect("N1", "N2");
        store.connect("N2", "N3");
        store.connect("N3", "N4");
        store.connect("N4", "N1");

        assert!(store.remove_node("n2"));
        assert!(!store.remove_node("N2"));
        assert_eq!(store.edges(), &[Edge::new("N3", "N4"), Edge::new("N4", "N1")]);
        assert!(!store.has_edge("N1", "N2"));
        assert_no_dangling_edges(&store);

        // The pair index is cleaned up too.
        store.add_node("X", Point::ZERO, ShapeKind::Rectangle, None);
        assert!(store.connect("N1", "N5"));
    }

    #[test]
    fn test_remove_edge() {
        let mut store = store_with(2);
        store.connect("N1", "N2");
        assert!(!store.remove_edge("N2", "N1"));
        assert!(store.remove_edge("n1", "n2"));
        assert!(!store.remove_edge("N1", "N2"));
        assert_eq!(store.edge_count(), 0);
        assert!(store.connect("N1", "N2"));
    }

    #[test]
    fn test_mixed_mutations_keep_invariants() {
        let mut store = store_with(6);
        for i in 1..=6 {
            for j in 1..=6 {
                store.connect(&format!("N{i}"), &format!("N{j}"));
            }
        }
        assert_eq!(store.edge_count(), 30);
        store.remove_node("N3");
        store.remove_edge("N1", "N2");
        store.add_node("New", Point::ZERO, ShapeKind::DecisionDiamond, None);
        store.connect("N7", "N1");
        store.remove_node("N6");
        assert_no_dangling_edges(&store);
        let keys: HashSet<_> = store.edges().iter().map(Edge::key).collect();
        assert_eq!(keys.len(), store.edge_count());
    }

    #[test]
    fn test_rename_and_move() {
        let mut store = store_with(1);
        assert!(store.rename_node("N1", "Start", Some(" first ")));
        assert!(!store.rename_node("N1", "Start", Some("first")));
        assert!(!store.rename_node("N5", "Other", None));
        assert!(store.move_node("n1", Point::new(40.0, 50.0)));
        let node = store.find_node("N1").unwrap();
        assert_eq!(node.title, "Start");
        assert_eq!(node.position, Point::new(40.0, 50.0));
        assert!(!store.move_node("N2", Point::ZERO));
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut store = store_with(3);
        store.connect("N1", "N2");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.add_node("A", Point::ZERO, ShapeKind::Rectangle, None).id(), "N1");
    }

    #[test]
    fn test_export_sorts_nodes_by_id() {
        let mut store = GraphStore::new();
        let state = ProjectState {
            nodes: vec![node_record("N10"), node_record("b"), node_record("N2"), node_record("a")],
            ..ProjectState::default()
        };
        store.import_snapshot(&state);
        store.connect("N2", "a");
        store.connect("N10", "b");

        let exported = store.export_snapshot("Forest");
        let ids: Vec<&str> = exported.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "N10", "N2"]);
        assert_eq!(exported.edges[0].from_id, "N2");
        assert_eq!(exported.edges[1].from_id, "N10");
        assert_eq!(exported.theme_key, "Forest");
    }

    #[test]
    fn test_import_tolerates_malformed_records() {
        let mut store = GraphStore::new();
        let state = ProjectState {
            nodes: vec![node_record(""), node_record("A"), node_record("A")],
            edges: vec![edge_record("A", "A"), edge_record("A", "Z")],
            ..ProjectState::default()
        };
        store.import_snapshot(&state);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.find_node("a").unwrap().title, DEFAULT_NODE_TITLE);
    }

    #[test]
    fn test_import_first_duplicate_wins_and_skips_blank_edges() {
        let mut store = GraphStore::new();
        let mut first = node_record("N1");
        first.title = Some("First".to_string());
        let mut second = node_record("n1");
        second.title = Some("Second".to_string());
        let state = ProjectState {
            nodes: vec![first, second, node_record("  "), node_record("N2")],
            edges: vec![
                edge_record("N1", "N2"),
                edge_record("n1", "n2"),
                edge_record(" ", "N2"),
                edge_record("N2", "N1"),
            ],
            ..ProjectState::default()
        };
        store.import_snapshot(&state);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.find_node("N1").unwrap().title, "First");
        assert_eq!(store.edges(), &[Edge::new("N1", "N2"), Edge::new("N2", "N1")]);
    }

    #[test]
    fn test_import_recomputes_id_counter() {
        let mut store = GraphStore::new();
        let state = ProjectState {
            nodes: vec![node_record("N7"), node_record("n12"), node_record("N"), node_record("Nx3"), node_record("start")],
            ..ProjectState::default()
        };
        store.import_snapshot(&state);
        assert_eq!(store.next_id(), 13);
        assert_eq!(store.add_node("next", Point::ZERO, ShapeKind::Rectangle, None).id(), "N13");

        store.import_snapshot(&ProjectState {
            nodes: vec![node_record("alpha")],
            ..ProjectState::default()
        });
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn test_import_replaces_previous_state() {
        let mut store = store_with(3);
        store.connect("N1", "N2");
        store.import_snapshot(&ProjectState::default());
        assert!(store.is_empty());
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_import_keeps_ids_that_differ_after_unicode_folding() {
        let mut store = GraphStore::new();
        store.import_snapshot(&ProjectState {
            nodes: vec![node_record("straße"), node_record("STRASSE"), node_record("é"), node_record("É")],
            ..ProjectState::default()
        });
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.find_node("strasse").map(Node::id), Some("STRASSE"));
        assert_eq!(store.find_node("STRAßE").map(Node::id), Some("straße"));
        assert_eq!(store.find_node("É").map(Node::id), Some("é"));
    }

    #[test]
    fn test_edges_of_matches_either_side() {
        let mut store = store_with(4);
        store.connect("N1", "N2");
        store.connect("N3", "N1");
        store.connect("N2", "N3");

        let touching: Vec<(&str, &str)> = store
            .edges_of("n1")
            .map(|e| (e.from_id.as_str(), e.to_id.as_str()))
            .collect();
        assert_eq!(touching, vec![("N1", "N2"), ("N3", "N1")]);
        assert_eq!(store.edges_of("N4").count(), 0);
    }

    #[test]
    fn test_shape_parse_lenient() {
        assert_eq!(ShapeKind::parse_lenient(Some("ellipse")), ShapeKind::Ellipse);
        assert_eq!(ShapeKind::parse_lenient(Some("DECISIONDIAMOND")), ShapeKind::DecisionDiamond);
        assert_eq!(ShapeKind::parse_lenient(Some("hexagon")), ShapeKind::Rectangle);
        assert_eq!(ShapeKind::parse_lenient(Some("   ")), ShapeKind::Rectangle);
        assert_eq!(ShapeKind::parse_lenient(None), ShapeKind::Rectangle);
        assert!("triangle".parse::<ShapeKind>().is_err());
    }
}
