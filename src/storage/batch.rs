//! Size-bounded write batching on top of [`KvStore`].
//!
//! Indexing one dictionary can stage hundreds of thousands of keys. The
//! writer groups them into transactions that never exceed the configured
//! mutation count or accumulated key size, committing the pending batch
//! before a write that would cross either limit.

use serde::{Deserialize, Serialize};

use super::error::StoreResult;
use super::kv::{KvStore, Mutation};

/// Per-transaction limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    /// Maximum number of writes in one transaction.
    pub max_mutations: usize,
    /// Maximum accumulated key bytes in one transaction.
    pub max_key_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_mutations: 1000,
            max_key_bytes: 81920,
        }
    }
}

/// Batch writer for one unit of work.
///
/// Not shared between dictionaries: each index build owns its own writer so
/// batches from different paths never interleave. Reads bypass the pending
/// batch and only see committed data.
#[derive(Debug)]
pub struct BatchedStore {
    store: KvStore,
    limits: BatchLimits,
    pending: Vec<Mutation>,
    pending_key_bytes: usize,
    commits: usize,
}

impl BatchedStore {
    pub fn new(store: KvStore, limits: BatchLimits) -> Self {
        Self {
            store,
            limits,
            pending: Vec::new(),
            pending_key_bytes: 0,
            commits: 0,
        }
    }

    /// Stage a write, committing the pending batch first if it is full.
    pub async fn stage(&mut self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<()> {
        self.push(Mutation::Put { key, value }).await
    }

    /// Stage a removal under the same limits as writes.
    pub async fn stage_delete(&mut self, key: Vec<u8>) -> StoreResult<()> {
        self.push(Mutation::Delete { key }).await
    }

    async fn push(&mut self, mutation: Mutation) -> StoreResult<()> {
        let key_bytes = mutation.key().len();
        if self.pending.len() >= self.limits.max_mutations
            || self.pending_key_bytes + key_bytes > self.limits.max_key_bytes
        {
            self.commit().await?;
        }

        self.pending_key_bytes += key_bytes;
        self.pending.push(mutation);
        Ok(())
    }

    /// Atomically apply everything staged so far. No-op when nothing is pending.
    pub async fn commit(&mut self) -> StoreResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(&mut self.pending);
        let count = batch.len();
        self.pending_key_bytes = 0;

        self.store.blocking(move |store| store.apply(&batch)).await?;
        self.commits += 1;
        crate::debug_event!("store", "commit", "{count} mutations");
        Ok(())
    }

    /// Immediate single write, outside the pending batch.
    pub async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<()> {
        self.store
            .blocking(move |store| store.set(&key, &value))
            .await
    }

    pub async fn get(&self, key: Vec<u8>) -> StoreResult<Option<Vec<u8>>> {
        self.store.blocking(move |store| store.get(&key)).await
    }

    pub async fn list(&self, prefix: Vec<u8>) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.store.blocking(move |store| store.list(&prefix)).await
    }

    /// Writes staged but not yet committed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Transactions committed by this writer.
    pub fn commits(&self) -> usize {
        self.commits
    }
}
