//! Snapshot-based undo/redo history.
//!
//! History is a linear sequence of snapshots plus a cursor. Pushing a state
//! identical to the one under the cursor is ignored, pushing after an undo
//! discards the redo branch, and the oldest entries are evicted once the
//! capacity is exceeded.

use crate::project::ProjectState;
use std::collections::VecDeque;

/// Maximum number of snapshots kept by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 120;

#[derive(Debug, Clone)]
struct HistoryEntry {
    state: ProjectState,
    signature: String,
}

impl HistoryEntry {
    fn new(state: &ProjectState) -> Self {
        Self {
            signature: state.signature(),
            state: state.clone(),
        }
    }
}

/// Linear undo/redo history over [`ProjectState`] snapshots.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    /// Index of the current entry; `None` until the first entry exists.
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history bounded to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Reset history to a single entry holding `state`.
    pub fn initialize_from(&mut self, state: &ProjectState) {
        self.entries.clear();
        self.entries.push_back(HistoryEntry::new(state));
        self.cursor = Some(0);
    }

    /// Record `state` as a new checkpoint.
    ///
    /// Returns false when the push was skipped because `state` matches the
    /// current entry and `force` is not set.
    pub fn push_state(&mut self, state: &ProjectState, force: bool) -> bool {
        let entry = HistoryEntry::new(state);

        if !force {
            if let Some(current) = self.current_entry() {
                if current.signature == entry.signature {
                    return false;
                }
            }
        }

        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }

        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
        log::debug!("History push: {} entries", self.entries.len());
        true
    }

    /// Step back one entry and return a copy of it.
    pub fn undo(&mut self) -> Option<ProjectState> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.current()
    }

    /// Step forward one entry and return a copy of it.
    pub fn redo(&mut self) -> Option<ProjectState> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.entries.len())?;
        self.cursor = Some(cursor + 1);
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Copy of the entry under the cursor.
    pub fn current(&self) -> Option<ProjectState> {
        self.current_entry().map(|entry| entry.state.clone())
    }

    fn current_entry(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
