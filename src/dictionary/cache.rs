//! Freshness-tracking cache shared by the in-process dictionaries.
//!
//! One entry per dictionary path, all behind a single mutex. Callers build
//! an index outside the lock and only take it to install the finished entry
//! or flip an active flag, so a half-built index is never observable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Cached state for one dictionary path.
#[derive(Debug)]
pub struct CacheEntry<I> {
    /// Modification time the index was built from, or `-1` if unknown.
    pub mtime: i64,
    /// Whether the path is part of the current watch set.
    pub active: bool,
    /// Fully built index payload.
    pub index: Arc<I>,
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStatus {
    pub mtime: i64,
    pub active: bool,
}

/// Path-keyed cache, in first-insertion order.
#[derive(Debug)]
pub struct DictionaryCache<I> {
    entries: Mutex<IndexMap<PathBuf, CacheEntry<I>>>,
}

impl<I> Default for DictionaryCache<I> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
        }
    }
}

impl<I> DictionaryCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the entry active if it was built from `mtime`.
    ///
    /// Returns `false` (and changes nothing) on a miss.
    pub fn activate_if_fresh(&self, path: &Path, mtime: i64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(path) {
            Some(entry) if entry.mtime == mtime => {
                entry.active = true;
                true
            }
            _ => false,
        }
    }

    /// Install a fully built index for `path` and mark it active.
    ///
    /// Replaces any previous entry for the same path.
    pub fn install(&self, path: PathBuf, mtime: i64, index: I) {
        let entry = CacheEntry {
            mtime,
            active: true,
            index: Arc::new(index),
        };
        self.entries.lock().insert(path, entry);
    }

    /// Deactivate every entry whose path is not in `paths`.
    ///
    /// Entries are kept so a later reactivation can skip the rebuild.
    /// Returns the number of entries that went inactive.
    pub fn retain_active(&self, paths: &[PathBuf]) -> usize {
        let mut entries = self.entries.lock();
        let mut deactivated = 0;
        for (path, entry) in entries.iter_mut() {
            if entry.active && !paths.contains(path) {
                entry.active = false;
                deactivated += 1;
            }
        }
        deactivated
    }

    /// Snapshot of active indexes. The lock is released before the caller
    /// traverses them.
    pub fn active_entries(&self) -> Vec<(PathBuf, Arc<I>)> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, entry)| entry.active)
            .map(|(path, entry)| (path.clone(), Arc::clone(&entry.index)))
            .collect()
    }

    pub fn status(&self, path: &Path) -> Option<EntryStatus> {
        self.entries.lock().get(path).map(|entry| EntryStatus {
            mtime: entry.mtime,
            active: entry.active,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
