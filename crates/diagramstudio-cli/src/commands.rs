use crate::{CliError, CliOptions, Command};
use diagramstudio_core::storage::AutoSaveManager;
use diagramstudio_core::{Canvas, EditorConfig, FileStorage, GraphStore, ProjectState, ShapeKind};
use kurbo::Rect;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Execute `options`, writing human-readable output to `out`.
pub fn run(options: &CliOptions, out: &mut dyn Write) -> Result<(), CliError> {
    let config = match &options.config {
        Some(path) => load_config(path)?,
        None => EditorConfig::default(),
    };

    match &options.command {
        Command::Info { path } => info(path, config, out),
        Command::Layout { input, output, snap } => {
            layout(input, output.as_deref().unwrap_or(input), *snap, config, out)
        }
        Command::Validate { path } => validate(path, out),
        Command::Autosaves { dir } => autosaves(dir.as_deref(), out),
        Command::Help => Ok(()),
    }
}

fn load_config(path: &Path) -> Result<EditorConfig, CliError> {
    let json = std::fs::read_to_string(path)?;
    EditorConfig::from_json(&json).map_err(|source| CliError::Config {
        path: path.display().to_string(),
        source,
    })
}

fn open(path: &Path, config: EditorConfig) -> Result<Canvas, CliError> {
    let state = ProjectState::read_from(path)?;
    let mut canvas = Canvas::new(config);
    canvas.set_snap_enabled(false);
    canvas.load_project(&state);
    Ok(canvas)
}

fn format_rect(rect: Rect) -> String {
    format!("{:.0},{:.0} - {:.0},{:.0}", rect.x0, rect.y0, rect.x1, rect.y1)
}

fn info(path: &Path, config: EditorConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let canvas = open(path, config)?;
    let state = canvas.capture_state();
    let graph = canvas.graph();

    let shapes = ShapeKind::ALL
        .iter()
        .map(|shape| {
            let count = graph.nodes().filter(|node| node.shape == *shape).count();
            format!("{} {}", shape, count)
        })
        .collect::<Vec<_>>()
        .join(", ");

    writeln!(out, "version: {}", state.version)?;
    writeln!(out, "theme: {}", state.theme_key)?;
    writeln!(out, "canvas: {} x {}", state.canvas_width, state.canvas_height)?;
    writeln!(out, "nodes: {} ({})", graph.node_count(), shapes)?;
    writeln!(out, "edges: {}", graph.edge_count())?;
    writeln!(out, "render: {}", canvas.render_plan().label())?;
    match canvas.diagram_bounds() {
        Some(bounds) => writeln!(out, "bounds: {}", format_rect(bounds))?,
        None => writeln!(out, "bounds: empty")?,
    }
    Ok(())
}

fn layout(input: &Path, output: &Path, snap: bool, config: EditorConfig, out: &mut dyn Write) -> Result<(), CliError> {
    let mut canvas = open(input, config)?;
    canvas.set_snap_enabled(snap);
    let placed = canvas.auto_layout();
    canvas.capture_state().write_to(output)?;
    writeln!(out, "Laid out {} node(s) into {}", placed, output.display())?;
    Ok(())
}

/// Records a project file would lose on import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub nodes_total: usize,
    pub nodes_kept: usize,
    pub edges_total: usize,
    pub edges_kept: usize,
    /// Nodes whose shape name is not recognised and loads as a rectangle.
    pub unknown_shapes: usize,
}

impl ValidationReport {
    pub fn of(state: &ProjectState) -> Self {
        let mut store = GraphStore::new();
        store.import_snapshot(state);
        let unknown_shapes = state
            .nodes
            .iter()
            .filter_map(|node| node.shape_type.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty() && name.parse::<ShapeKind>().is_err())
            .count();
        Self {
            nodes_total: state.nodes.len(),
            nodes_kept: store.node_count(),
            edges_total: state.edges.len(),
            edges_kept: store.edge_count(),
            unknown_shapes,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.nodes_kept == self.nodes_total && self.edges_kept == self.edges_total && self.unknown_shapes == 0
    }
}

fn validate(path: &Path, out: &mut dyn Write) -> Result<(), CliError> {
    let state = ProjectState::read_from(path)?;
    let report = ValidationReport::of(&state);
    writeln!(out, "nodes: {} of {} kept", report.nodes_kept, report.nodes_total)?;
    writeln!(out, "edges: {} of {} kept", report.edges_kept, report.edges_total)?;
    if report.unknown_shapes > 0 {
        writeln!(out, "unknown shapes: {}", report.unknown_shapes)?;
    }
    if report.is_clean() {
        writeln!(out, "ok")?;
        Ok(())
    } else {
        Err(CliError::Invalid(format!("{} has records that will not load as written", path.display())))
    }
}

fn autosaves(dir: Option<&Path>, out: &mut dyn Write) -> Result<(), CliError> {
    let manager = match dir {
        Some(dir) => AutoSaveManager::new(Arc::new(FileStorage::new(dir.to_path_buf())?)),
        None => AutoSaveManager::with_default_location()?,
    };
    log::debug!("Listing autosaves in {}", manager.storage().base_path().display());
    let keys = pollster::block_on(manager.list_autosaves())?;
    if keys.is_empty() {
        writeln!(out, "no autosaves")?;
    }
    for key in keys {
        writeln!(out, "{}", manager.storage().project_path(&key).display())?;
    }
    Ok(())
}
