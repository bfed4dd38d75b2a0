//! File-based storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::project::{PROJECT_FILE_EXTENSION, ProjectState};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "DiagramStudio";

/// Stores projects as `<key>.diagram.json` files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// File storage in the platform local data directory.
    ///
    /// On Linux: `~/.local/share/DiagramStudio/`
    /// On Windows: `%LOCALAPPDATA%\DiagramStudio\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join(APP_DIR_NAME))
    }

    /// Path a key is stored at. Characters unsafe in file names become `_`.
    pub fn project_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.{}", safe_key, PROJECT_FILE_EXTENSION))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn key_from_file_name(name: &str) -> Option<&str> {
    name.strip_suffix(PROJECT_FILE_EXTENSION)?
        .strip_suffix('.')
        .filter(|key| !key.is_empty())
}

impl Storage for FileStorage {
    fn save(&self, key: &str, project: &ProjectState) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(key);
        let json = match project.to_json() {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) }),
        };

        Box::pin(async move {
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            log::debug!("Saved project to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<ProjectState>> {
        let path = self.project_path(key);
        let key = key.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }

            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            ProjectState::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut keys: Vec<String> = entries
                .flatten()
                .filter_map(|entry| {
                    let name = entry.file_name();
                    key_from_file_name(name.to_str()?).map(str::to_string)
                })
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.project_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}
