//! Storage abstraction for persistence.

mod autosave;
mod file;
mod memory;

pub use autosave::{
    AutoSaveManager,
    AutoSaveOutcome,
    SkipReason,
    DEFAULT_AUTOSAVE_INTERVAL_SECS,
    UNSAVED_AUTOSAVE_KEY,
    autosave_key,
};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::project::ProjectState;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence sink for project snapshots, keyed by name.
///
/// The engine never touches storage media itself; editors hand snapshots to
/// an implementation of this trait.
pub trait Storage: Send + Sync {
    /// Save a project.
    fn save(&self, key: &str, project: &ProjectState) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a project.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<ProjectState>>;

    /// Delete a project.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a project exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
