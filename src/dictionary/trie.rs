//! In-memory dictionary: one [`PrefixTrie`] per file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::reader::{self, UNKNOWN_MTIME, WordStream};
use super::{
    ActivationReport, Dictionary, DictionaryCache, DictionaryError, DictionaryResult,
    EntryStatus, IndexStats, Item, StatsSnapshot, UpdateOutcome, activate_cached,
};
use crate::trie::PrefixTrie;

/// Dictionary backed by per-file tries.
///
/// A changed file invalidates its whole trie; there is no incremental word
/// removal.
#[derive(Debug, Default)]
pub struct TrieDictionary {
    cache: DictionaryCache<PrefixTrie>,
    stats: IndexStats,
}

impl TrieDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    async fn build(path: &Path) -> std::io::Result<PrefixTrie> {
        let mut words = WordStream::open(path).await?;
        let mut trie = PrefixTrie::new();
        while let Some(word) = words.next_word().await? {
            trie.insert(&word);
        }
        Ok(trie)
    }
}

#[async_trait]
impl Dictionary for TrieDictionary {
    fn name(&self) -> &str {
        "trie"
    }

    async fn activate(&self, paths: &[PathBuf]) -> ActivationReport {
        activate_cached(self, &self.cache, paths).await
    }

    async fn update(&self, path: &Path, force: bool) -> DictionaryResult<UpdateOutcome> {
        let mtime = reader::modified_millis(path)
            .await
            .map_err(|e| DictionaryError::io(path, e))?;

        if let Some(mtime) = mtime {
            if !force && self.cache.activate_if_fresh(path, mtime) {
                return Ok(UpdateOutcome::Fresh);
            }
        }

        let trie = Self::build(path)
            .await
            .map_err(|e| DictionaryError::io(path, e))?;
        let words = trie.len();
        self.stats.record_read(words);

        self.cache
            .install(path.to_path_buf(), mtime.unwrap_or(UNKNOWN_MTIME), trie);
        crate::debug_event!("trie", "indexed", "{} ({words} words)", path.display());
        Ok(UpdateOutcome::Rebuilt { words })
    }

    async fn search(&self, prefix: &str, show_path: bool) -> DictionaryResult<Vec<Item>> {
        let mut items = Vec::new();
        for (path, trie) in self.cache.active_entries() {
            items.extend(
                trie.search(prefix)
                    .into_iter()
                    .map(|word| Item::new(word, &path, show_path)),
            );
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
