//! Dictionary persisted in a redb store, one key namespace per file.
//!
//! The modification time of the last completed build is stored next to the
//! words, so a freshly started process can skip unchanged files without any
//! in-memory index.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::reader::{self, UNKNOWN_MTIME, WordStream};
use super::{
    ActivationReport, Dictionary, DictionaryCache, DictionaryError, DictionaryResult,
    EntryStatus, IndexStats, Item, StatsSnapshot, UpdateOutcome, activate_cached,
};
use crate::storage::kv::{decode_mtime, encode_mtime};
use crate::storage::{BatchLimits, BatchedStore, KvStore, Namespace, StoreError};

/// Dictionary backed by a shared [`KvStore`].
#[derive(Debug)]
pub struct PersistentDictionary {
    store: KvStore,
    limits: BatchLimits,
    cache: DictionaryCache<Namespace>,
    stats: IndexStats,
}

impl PersistentDictionary {
    pub fn new(store: KvStore, limits: BatchLimits) -> Self {
        Self {
            store,
            limits,
            cache: DictionaryCache::new(),
            stats: IndexStats::default(),
        }
    }

    /// Open the store at `database_path`.
    pub fn open(database_path: &Path, limits: BatchLimits) -> DictionaryResult<Self> {
        let store = KvStore::open(database_path).map_err(|source| DictionaryError::StoreOpen {
            path: database_path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(store, limits))
    }

    async fn stored_mtime(&self, namespace: &Namespace) -> Result<Option<i64>, StoreError> {
        let key = namespace.mtime_key();
        self.store
            .blocking(move |store| {
                store
                    .get(&key)?
                    .map(|value| decode_mtime(&key, &value))
                    .transpose()
            })
            .await
    }

    /// Write every word of `path` into its namespace and drop words that
    /// are no longer in the file.
    ///
    /// Existing words stay searchable while the rebuild runs; the stale
    /// sweep happens only after all new words are committed. Only a first
    /// build is invisible until complete, since the entry is not installed
    /// before the mtime key is written. Rebuilding an active namespace
    /// writes in place, so a concurrent search can see old and new words
    /// together, and a failed rebuild leaves that mix until the next update
    /// retries it.
    async fn rebuild(&self, path: &Path, namespace: &Namespace) -> DictionaryResult<usize> {
        let mut batch = BatchedStore::new(self.store.clone(), self.limits);
        let mut words = WordStream::open(path)
            .await
            .map_err(|e| DictionaryError::io(path, e))?;

        let mut seen = HashSet::new();
        while let Some(word) = words
            .next_word()
            .await
            .map_err(|e| DictionaryError::io(path, e))?
        {
            if seen.contains(&word) {
                continue;
            }
            batch
                .stage(namespace.word_key(&word), word.clone().into_bytes())
                .await
                .map_err(|e| DictionaryError::store(path, e))?;
            seen.insert(word);
        }
        batch
            .commit()
            .await
            .map_err(|e| DictionaryError::store(path, e))?;

        let existing = batch
            .list(namespace.word_prefix(""))
            .await
            .map_err(|e| DictionaryError::store(path, e))?;
        for (key, value) in existing {
            if !seen.contains(String::from_utf8_lossy(&value).as_ref()) {
                batch
                    .stage_delete(key)
                    .await
                    .map_err(|e| DictionaryError::store(path, e))?;
            }
        }
        batch
            .commit()
            .await
            .map_err(|e| DictionaryError::store(path, e))?;

        crate::debug_event!(
            "persistent",
            "committed",
            "{} in {} transactions",
            path.display(),
            batch.commits()
        );
        Ok(seen.len())
    }
}

#[async_trait]
impl Dictionary for PersistentDictionary {
    fn name(&self) -> &str {
        "persistent"
    }

    async fn activate(&self, paths: &[PathBuf]) -> ActivationReport {
        activate_cached(self, &self.cache, paths).await
    }

    async fn update(&self, path: &Path, force: bool) -> DictionaryResult<UpdateOutcome> {
        let mtime = reader::modified_millis(path)
            .await
            .map_err(|e| DictionaryError::io(path, e))?;
        let namespace = Namespace::new(path);

        if let Some(mtime) = mtime {
            if !force {
                if self.cache.activate_if_fresh(path, mtime) {
                    return Ok(UpdateOutcome::Fresh);
                }
                let stored = self
                    .stored_mtime(&namespace)
                    .await
                    .map_err(|e| DictionaryError::store(path, e))?;
                if stored == Some(mtime) {
                    self.cache.install(path.to_path_buf(), mtime, namespace);
                    return Ok(UpdateOutcome::Fresh);
                }
            }
        }

        let words = self.rebuild(path, &namespace).await?;
        self.stats.record_read(words);

        // The mtime key marks the build complete; it is written last.
        let mtime = mtime.unwrap_or(UNKNOWN_MTIME);
        let key = namespace.mtime_key();
        self.store
            .blocking(move |store| store.set(&key, &encode_mtime(mtime)))
            .await
            .map_err(|e| DictionaryError::store(path, e))?;

        self.cache.install(path.to_path_buf(), mtime, namespace);
        crate::log_event!("persistent", "indexed", "{} ({words} words)", path.display());
        Ok(UpdateOutcome::Rebuilt { words })
    }

    async fn search(&self, prefix: &str, show_path: bool) -> DictionaryResult<Vec<Item>> {
        let mut items = Vec::new();
        for (path, namespace) in self.cache.active_entries() {
            let scan = namespace.word_prefix(prefix);
            let entries = self
                .store
                .blocking(move |store| store.list(&scan))
                .await
                .map_err(|e| DictionaryError::store(&path, e))?;

            items.extend(entries.into_iter().map(|(_, value)| {
                let word = String::from_utf8_lossy(&value).into_owned();
                Item::new(word, &path, show_path)
            }));
        }
        Ok(items)
    }

    fn status(&self, path: &Path) -> Option<EntryStatus> {
        self.cache.status(path)
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
