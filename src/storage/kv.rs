//! Key-value backend for persistent dictionaries.
//!
//! A single redb table holds every dictionary. Keys are namespaced by the
//! dictionary path:
//!
//! ```text
//! <path> 0x00 "word"  0x00 <word bytes>   ->  <word bytes>
//! <path> 0x00 "mtime"                     ->  i64 (big-endian, milliseconds)
//! ```
//!
//! A character prefix of a word is a byte prefix of its UTF-8 encoding, so
//! prefix queries become range scans starting at `<path> 0x00 "word" 0x00
//! <prefix>`, and results come back ordered by word bytes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use super::error::{StoreError, StoreResult};

const ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("entries");

const SEPARATOR: u8 = 0x00;
const WORD_SEGMENT: &[u8] = b"word";
const MTIME_SEGMENT: &[u8] = b"mtime";

/// Key namespace owned by one dictionary file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    root: Vec<u8>,
}

impl Namespace {
    pub fn new(path: &Path) -> Self {
        let mut root = path.as_os_str().as_encoded_bytes().to_vec();
        root.push(SEPARATOR);
        Self { root }
    }

    /// Key under which `word` is stored.
    pub fn word_key(&self, word: &str) -> Vec<u8> {
        let mut key = self.segment(WORD_SEGMENT, word.len() + 1);
        key.push(SEPARATOR);
        key.extend_from_slice(word.as_bytes());
        key
    }

    /// Scan prefix covering every stored word starting with `prefix`.
    pub fn word_prefix(&self, prefix: &str) -> Vec<u8> {
        self.word_key(prefix)
    }

    /// Key holding the modification time of the last completed index build.
    pub fn mtime_key(&self) -> Vec<u8> {
        self.segment(MTIME_SEGMENT, 0)
    }

    fn segment(&self, tag: &[u8], extra: usize) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.root.len() + tag.len() + extra);
        key.extend_from_slice(&self.root);
        key.extend_from_slice(tag);
        key
    }
}

/// Encode a modification time for storage.
pub fn encode_mtime(mtime: i64) -> Vec<u8> {
    mtime.to_be_bytes().to_vec()
}

/// Decode a stored modification time.
pub fn decode_mtime(key: &[u8], value: &[u8]) -> StoreResult<i64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::InvalidValue {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: format!("expected 8 bytes, found {}", value.len()),
    })?;
    Ok(i64::from_be_bytes(bytes))
}

/// One pending write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Mutation {
    pub fn key(&self) -> &[u8] {
        match self {
            Mutation::Put { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// Shared handle to the on-disk store.
///
/// Cloning is cheap; all clones share one open database. Methods block on
/// disk I/O. Async callers go through [`KvStore::blocking`].
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
    path: PathBuf,
    #[cfg(test)]
    faults: Arc<ApplyFaults>,
}

/// Fails write transactions after a set number of successful ones.
#[cfg(test)]
#[derive(Debug)]
struct ApplyFaults {
    remaining: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ApplyFaults {
    const DISABLED: usize = usize::MAX;

    fn check(&self) -> StoreResult<()> {
        use std::sync::atomic::Ordering;

        let outcome = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                Self::DISABLED | 0 => None,
                left => Some(left - 1),
            });
        match outcome {
            Err(0) => Err(StoreError::Io(std::io::Error::other("injected write failure"))),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore").field("path", &self.path).finish()
    }
}

impl KvStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&path)?;

        // Readers fail on a missing table, so make sure it exists up front.
        let txn = db.begin_write()?;
        {
            let _entries = txn.open_table(ENTRIES)?;
        }
        txn.commit()?;

        crate::debug_event!("store", "opened", "{}", path.display());
        Ok(Self {
            db: Arc::new(db),
            path,
            #[cfg(test)]
            faults: Arc::new(ApplyFaults {
                remaining: std::sync::atomic::AtomicUsize::new(ApplyFaults::DISABLED),
            }),
        })
    }

    /// Let `successes` more write transactions through, then fail every
    /// later one until [`KvStore::heal`] is called.
    #[cfg(test)]
    pub(crate) fn fail_writes_after(&self, successes: usize) {
        self.faults
            .remaining
            .store(successes, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn heal(&self) {
        self.fail_writes_after(ApplyFaults::DISABLED);
    }

    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ENTRIES)?;
        Ok(table.get(key)?.map(|value| value.value().to_vec()))
    }

    /// All entries whose key starts with `prefix`, in key order.
    pub fn list(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ENTRIES)?;

        let mut entries = Vec::new();
        for entry in table.range(prefix..)? {
            let (key, value) = entry?;
            if !key.value().starts_with(prefix) {
                break;
            }
            entries.push((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(entries)
    }

    /// Write a single entry in its own transaction.
    pub fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.apply(&[Mutation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }])
    }

    /// Apply all mutations atomically in one write transaction.
    pub fn apply(&self, mutations: &[Mutation]) -> StoreResult<()> {
        #[cfg(test)]
        self.faults.check()?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ENTRIES)?;
            for mutation in mutations {
                match mutation {
                    Mutation::Put { key, value } => {
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    Mutation::Delete { key } => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Run blocking store work off the async runtime.
    pub async fn blocking<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&KvStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || work(&store)).await?
    }
}
