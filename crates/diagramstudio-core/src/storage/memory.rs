//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::project::ProjectState;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory storage for tests and scratch sessions.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<BTreeMap<String, ProjectState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(e: impl std::fmt::Display) -> StorageError {
        StorageError::Other(format!("Lock error: {}", e))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, project: &ProjectState) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let project = project.clone();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(Self::lock_error)?;
            projects.insert(key, project);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<ProjectState>> {
        let key = key.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            projects.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(Self::lock_error)?;
            projects.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            Ok(projects.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(Self::lock_error)?;
            Ok(projects.contains_key(&key))
        })
    }
}
