//! Diagram Studio command-line tools
//!
//! Inspects, validates and re-lays out `.diagram.json` project files, and
//! lists autosave recovery snapshots.

mod commands;

pub use commands::{ValidationReport, run};

use diagramstudio_core::{ProjectError, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// A parsed sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a summary of a project file.
    Info { path: PathBuf },
    /// Apply grid auto-layout and write the result.
    Layout {
        input: PathBuf,
        /// Defaults to overwriting `input`.
        output: Option<PathBuf>,
        snap: bool,
    },
    /// Report records that would be dropped on import.
    Validate { path: PathBuf },
    /// List autosave snapshots, in `dir` or the default location.
    Autosaves { dir: Option<PathBuf> },
    Help,
}

/// Command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub command: Command,
    /// Editor configuration JSON overriding the defaults.
    pub config: Option<PathBuf>,
}

/// Malformed command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// Errors reported by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Usage text for `program`.
pub fn usage_text(program: &str) -> String {
    format!(
        "Usage:\n  {program} info <file> [--config <file>]\n  {program} layout <in> [<out>] [--snap] [--config <file>]\n  {program} validate <file>\n  {program} autosaves [--dir <dir>]\n  {program} --help\n\nlayout arranges nodes on a grid in id order and overwrites <in> unless <out> is given.\n--snap aligns the result to the editor grid.\n\nSet RUST_LOG=debug for diagnostics."
    )
}

fn usage(message: impl Into<String>) -> UsageError {
    UsageError(message.into())
}

/// Parse arguments following the program name.
pub fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, UsageError> {
    let Some(name) = args.next() else {
        return Err(usage("missing command"));
    };

    let mut positional = Vec::new();
    let mut snap = false;
    let mut config = None;
    let mut dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snap" => {
                if snap {
                    return Err(usage("--snap given twice"));
                }
                snap = true;
            }
            "--config" => {
                if config.is_some() {
                    return Err(usage("--config given twice"));
                }
                config = Some(PathBuf::from(args.next().ok_or_else(|| usage("--config needs a path"))?));
            }
            "--dir" => {
                if dir.is_some() {
                    return Err(usage("--dir given twice"));
                }
                dir = Some(PathBuf::from(args.next().ok_or_else(|| usage("--dir needs a path"))?));
            }
            "-h" | "--help" => {
                return Ok(CliOptions { command: Command::Help, config: None });
            }
            _ if arg.starts_with('-') => return Err(usage(format!("unknown option {arg}"))),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    let command = match name.as_str() {
        "-h" | "--help" | "help" => Command::Help,
        "info" => Command::Info {
            path: positional.next().ok_or_else(|| usage("info needs a file"))?,
        },
        "validate" => Command::Validate {
            path: positional.next().ok_or_else(|| usage("validate needs a file"))?,
        },
        "layout" => Command::Layout {
            input: positional.next().ok_or_else(|| usage("layout needs an input file"))?,
            output: positional.next(),
            snap,
        },
        "autosaves" => Command::Autosaves { dir: dir.take() },
        other => return Err(usage(format!("unknown command {other}"))),
    };

    if positional.next().is_some() {
        return Err(usage("too many arguments"));
    }
    if snap && !matches!(command, Command::Layout { .. }) {
        return Err(usage("--snap only applies to layout"));
    }
    if dir.is_some() {
        return Err(usage("--dir only applies to autosaves"));
    }
    if config.is_some() && !matches!(command, Command::Info { .. } | Command::Layout { .. }) {
        return Err(usage("--config only applies to info and layout"));
    }

    Ok(CliOptions { command, config })
}
