//! Watched dictionary paths and the directories that cover them.
//!
//! notify reports absolute (often canonical) paths, while dictionaries are
//! keyed by the path the user configured. The registry maps one to the
//! other and computes the minimal set of parent directories to watch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Registry for watched dictionary files.
#[derive(Debug, Default)]
pub struct PathRegistry {
    /// Resolved path -> configured path.
    paths: HashMap<PathBuf, PathBuf>,
    /// Computed watch directories (parent dirs of tracked files).
    watch_dirs: HashSet<PathBuf>,
    /// Configured paths in the order they were given.
    configured: Vec<PathBuf>,
}

impl PathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a configured path the way notify reports it.
    ///
    /// Canonicalizes when the file exists, otherwise joins relative paths
    /// onto `root`.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        joined.canonicalize().unwrap_or(joined)
    }

    /// Replace the tracked paths, returning directories not watched before.
    pub fn rebuild(&mut self, root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
        let old_dirs = std::mem::take(&mut self.watch_dirs);
        self.paths.clear();
        self.configured = paths.to_vec();

        for path in paths {
            let resolved = Self::resolve(root, path);
            if let Some(parent) = resolved.parent() {
                self.watch_dirs.insert(parent.to_path_buf());
            }
            self.paths.insert(resolved, path.clone());
        }

        self.watch_dirs.difference(&old_dirs).cloned().collect()
    }

    /// Configured path for an event path, if it is tracked.
    pub fn lookup(&self, event_path: &Path) -> Option<&Path> {
        self.paths.get(event_path).map(PathBuf::as_path)
    }

    /// Whether the registry was built from exactly `paths`.
    pub fn is_built_from(&self, paths: &[PathBuf]) -> bool {
        self.configured == paths
    }

    /// Get all watch directories.
    pub fn watch_dirs(&self) -> &HashSet<PathBuf> {
        &self.watch_dirs
    }

    /// Get count of tracked paths.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Get count of watch directories.
    pub fn dir_count(&self) -> usize {
        self.watch_dirs.len()
    }
}
