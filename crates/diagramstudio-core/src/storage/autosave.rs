//! Auto-save functionality for project persistence.
//!
//! Periodically writes the current project to a recovery key so an editing
//! session can be restored after a crash.

use crate::canvas::Canvas;
use crate::project::ProjectState;
use crate::storage::{FileStorage, Storage, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 20;

/// Recovery key for a project that has never been saved.
pub const UNSAVED_AUTOSAVE_KEY: &str = "unsaved-autosave";

const AUTOSAVE_SUFFIX: &str = "-autosave";

/// Recovery key for a document, or the shared unsaved key.
pub fn autosave_key(document: Option<&str>) -> String {
    match document {
        Some(name) if !name.trim().is_empty() => format!("{}{}", name.trim(), AUTOSAVE_SUFFIX),
        _ => UNSAVED_AUTOSAVE_KEY.to_string(),
    }
}

/// Result of an auto-save tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveOutcome {
    Saved,
    Skipped(SkipReason),
}

/// Why a tick did not write anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing changed since the last auto-save.
    NotDirty,
    /// A previous save has not finished yet.
    InProgress,
    IntervalNotElapsed,
}

/// Clears the in-flight flag when the save completes or its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Manages automatic project persistence.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Mutex<Option<Instant>>,
    /// Bumped on every change; compared with `saved_generation`.
    generation: AtomicU64,
    saved_generation: AtomicU64,
    /// Signature of the last state written.
    saved_signature: Mutex<Option<String>>,
    in_flight: AtomicBool,
    /// Name of the open document; `None` while unsaved.
    document: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: Mutex::new(None),
            generation: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            saved_signature: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            document: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the project as having changes not yet auto-saved.
    pub fn mark_dirty(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Forget pending changes, e.g. after an explicit save.
    pub fn mark_clean(&self) {
        self.saved_generation
            .store(self.generation.load(Ordering::Acquire), Ordering::Release);
    }

    /// Fold in the editor's own dirty flag. A dirty editor whose state
    /// differs from the last auto-saved one counts as a pending change.
    pub fn observe(&self, editor_dirty: bool, project: &ProjectState) {
        if !editor_dirty || self.is_dirty() {
            return;
        }
        let signature = project.signature();
        let already_saved = self
            .saved_signature
            .lock()
            .ok()
            .is_some_and(|saved| saved.as_deref() == Some(signature.as_str()));
        if !already_saved {
            self.mark_dirty();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::Acquire) != self.saved_generation.load(Ordering::Acquire)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Set the open document's name. Changes the recovery key.
    pub fn set_document(&mut self, document: Option<String>) {
        self.document = document;
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Recovery key for the open document.
    pub fn key(&self) -> String {
        autosave_key(self.document.as_deref())
    }

    fn interval_elapsed(&self) -> bool {
        match self.last_save.lock().ok().and_then(|last| *last) {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Why a tick right now would be skipped, if it would.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if self.is_saving() {
            Some(SkipReason::InProgress)
        } else if !self.is_dirty() {
            Some(SkipReason::NotDirty)
        } else if !self.interval_elapsed() {
            Some(SkipReason::IntervalNotElapsed)
        } else {
            None
        }
    }

    /// Timer entry point: save `project` if it is dirty, the interval has
    /// elapsed and no other save is running.
    pub async fn tick(&self, project: &ProjectState) -> StorageResult<AutoSaveOutcome> {
        if let Some(reason) = self.skip_reason() {
            log::trace!("Autosave skipped: {:?}", reason);
            return Ok(AutoSaveOutcome::Skipped(reason));
        }
        self.write(project).await
    }

    /// Timer entry point for an editing session. Polls the canvas's dirty
    /// flag, so edits need no separate `mark_dirty` call.
    pub async fn tick_canvas(&self, canvas: &Canvas) -> StorageResult<AutoSaveOutcome> {
        let project = canvas.capture_state();
        self.observe(canvas.is_dirty(), &project);
        self.tick(&project).await
    }

    /// Save immediately, ignoring the interval and the dirty state, unless
    /// another save is running.
    pub async fn save_now(&self, project: &ProjectState) -> StorageResult<AutoSaveOutcome> {
        self.write(project).await
    }

    async fn write(&self, project: &ProjectState) -> StorageResult<AutoSaveOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Ok(AutoSaveOutcome::Skipped(SkipReason::InProgress));
        };
        let generation = self.generation.load(Ordering::Acquire);
        let key = self.key();

        if let Err(e) = self.storage.save(&key, project).await {
            log::warn!("Autosave to '{}' failed: {}", key, e);
            return Err(e);
        }

        // Changes made while the save was running stay dirty.
        self.saved_generation.fetch_max(generation, Ordering::AcqRel);
        let mut last_save = self
            .last_save
            .lock()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        *last_save = Some(Instant::now());
        if let Ok(mut saved) = self.saved_signature.lock() {
            *saved = Some(project.signature());
        }
        log::debug!("Autosaved '{}'", key);
        Ok(AutoSaveOutcome::Saved)
    }

    /// Load the recovery snapshot of the open document, if one exists.
    pub async fn load_last(&self) -> Option<ProjectState> {
        let key = self.key();
        match self.storage.load(&key).await {
            Ok(project) => Some(project),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("Failed to read autosave '{}': {}", key, e);
                None
            }
        }
    }

    /// Remove the recovery snapshot of the open document.
    pub async fn discard(&self) -> StorageResult<()> {
        self.storage.delete(&self.key()).await
    }

    /// Keys of every stored recovery snapshot.
    pub async fn list_autosaves(&self) -> StorageResult<Vec<String>> {
        let mut keys = self.storage.list().await?;
        keys.retain(|key| key.ends_with(AUTOSAVE_SUFFIX));
        Ok(keys)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

impl AutoSaveManager<FileStorage> {
    /// Auto-save manager writing to the default file location.
    pub fn with_default_location() -> StorageResult<Self> {
        Ok(Self::new(Arc::new(FileStorage::default_location()?)))
    }
}
