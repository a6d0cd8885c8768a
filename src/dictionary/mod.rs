//! Dictionary backends behind one capability set.
//!
//! # Architecture
//!
//! ```text
//!              Dictionary (activate / update / search)
//!                           |
//!       +-------------------+--------------------+
//!       |                   |                    |
//!  TrieDictionary   PersistentDictionary   ExternalDictionary
//!  PrefixTrie/path  redb namespace/path    command per path
//!       |                   |
//!       +--- DictionaryCache ---+
//! ```
//!
//! `activate` replaces the watch set: entries for dropped paths go
//! inactive (but stay cached), every requested path is updated
//! concurrently, and per-path failures are collected rather than aborting
//! the whole call.

mod cache;
mod error;
mod external;
mod persistent;
pub mod reader;
mod trie;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

pub use cache::{CacheEntry, DictionaryCache, EntryStatus};
pub use error::{DictionaryError, DictionaryResult};
pub use external::ExternalDictionary;
pub use persistent::PersistentDictionary;
pub use trie::TrieDictionary;

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub word: String,
    /// Originating dictionary path when requested, otherwise empty.
    pub info: String,
}

impl Item {
    pub(crate) fn new(word: String, path: &Path, show_path: bool) -> Self {
        let info = if show_path {
            path.display().to_string()
        } else {
            String::new()
        };
        Self { word, info }
    }
}

/// Result of a single `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Recorded modification time matched; nothing was read.
    Fresh,
    /// The index was rebuilt from the file.
    Rebuilt { words: usize },
    /// The backend keeps no local index.
    Skipped,
}

/// Summary of an `activate` call.
#[derive(Debug, Default)]
pub struct ActivationReport {
    /// Paths whose cached index was reused.
    pub fresh: Vec<PathBuf>,
    /// Paths that were (re)indexed.
    pub rebuilt: Vec<PathBuf>,
    /// Paths whose update failed; their previous entry is left as it was.
    pub failed: Vec<(PathBuf, DictionaryError)>,
    /// Entries that dropped out of the watch set.
    pub deactivated: usize,
}

impl ActivationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: PathBuf, result: DictionaryResult<UpdateOutcome>) {
        match result {
            Ok(UpdateOutcome::Rebuilt { .. }) => self.rebuilt.push(path),
            Ok(UpdateOutcome::Fresh | UpdateOutcome::Skipped) => self.fresh.push(path),
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    "[dictionary] update failed for {}, retrying next cycle: {e}",
                    path.display()
                );
                self.failed.push((path, e));
            }
            Err(e) => {
                tracing::warn!("[dictionary] update failed for {}: {e}", path.display());
                self.failed.push((path, e));
            }
        }
    }
}

/// Counters describing indexing work done by a dictionary.
#[derive(Debug, Default)]
pub struct IndexStats {
    files_read: AtomicU64,
    words_indexed: AtomicU64,
}

/// Point-in-time copy of [`IndexStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_read: u64,
    pub words_indexed: u64,
}

impl IndexStats {
    pub(crate) fn record_read(&self, words: usize) {
        self.files_read.fetch_add(1, Ordering::Relaxed);
        self.words_indexed.fetch_add(words as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_read: self.files_read.load(Ordering::Relaxed),
            words_indexed: self.words_indexed.load(Ordering::Relaxed),
        }
    }
}

/// Capability set shared by every dictionary backend.
#[async_trait]
pub trait Dictionary: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Replace the watch set with `paths`.
    async fn activate(&self, paths: &[PathBuf]) -> ActivationReport;

    /// Bring the index for `path` up to date with the file on disk.
    ///
    /// Unless `force` is set, a matching modification time short-circuits
    /// without reading the file. On success the entry is active.
    async fn update(&self, path: &Path, force: bool) -> DictionaryResult<UpdateOutcome>;

    /// Words starting with `prefix` across all active paths.
    async fn search(&self, prefix: &str, show_path: bool) -> DictionaryResult<Vec<Item>>;

    /// Cached state for `path`, if the backend tracks one.
    fn status(&self, _path: &Path) -> Option<EntryStatus> {
        None
    }

    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::default()
    }
}

/// Requested paths with duplicates removed, order kept.
fn unique_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|path| seen.insert(path.as_path()))
        .cloned()
        .collect()
}

/// Shared `activate` for the cache-backed dictionaries.
async fn activate_cached<D, I>(
    dictionary: &D,
    cache: &DictionaryCache<I>,
    paths: &[PathBuf],
) -> ActivationReport
where
    D: Dictionary + ?Sized,
{
    let paths = unique_paths(paths);
    let mut report = ActivationReport {
        deactivated: cache.retain_active(&paths),
        ..Default::default()
    };

    let updates = paths.iter().map(|path| async move {
        let result = dictionary.update(path, false).await;
        (path.clone(), result)
    });
    for (path, result) in join_all(updates).await {
        report.record(path, result);
    }

    crate::debug_event!(
        dictionary.name(),
        "activated",
        "{} fresh, {} rebuilt, {} failed, {} deactivated",
        report.fresh.len(),
        report.rebuilt.len(),
        report.failed.len(),
        report.deactivated
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_paths_keeps_first_occurrence() {
        let paths = vec![
            PathBuf::from("b"),
            PathBuf::from("a"),
            PathBuf::from("b"),
        ];
        assert_eq!(
            unique_paths(&paths),
            vec![PathBuf::from("b"), PathBuf::from("a")]
        );
    }

    #[test]
    fn test_item_info_follows_show_path() {
        let path = Path::new("/dicts/en.txt");
        assert_eq!(Item::new("w".into(), path, false).info, "");
        assert_eq!(Item::new("w".into(), path, true).info, "/dicts/en.txt");
    }

    #[test]
    fn test_report_sorts_outcomes() {
        let mut report = ActivationReport::default();
        report.record(PathBuf::from("a"), Ok(UpdateOutcome::Fresh));
        report.record(PathBuf::from("b"), Ok(UpdateOutcome::Rebuilt { words: 3 }));
        report.record(
            PathBuf::from("c"),
            Err(DictionaryError::io(
                "c",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )),
        );

        assert_eq!(report.fresh, vec![PathBuf::from("a")]);
        assert_eq!(report.rebuilt, vec![PathBuf::from("b")]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
    }
}
