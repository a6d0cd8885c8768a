//! Prefix completion over dictionary files.
//!
//! Word lists are indexed per file, either as in-memory tries or as key
//! namespaces in a persistent [redb](https://docs.rs/redb) store, and kept
//! fresh by comparing file modification times. An external command can
//! replace the local index entirely.

pub mod cli;
pub mod command;
pub mod config;
pub mod dictionary;
pub mod logging;
pub mod source;
pub mod storage;
pub mod trie;
pub mod watcher;

pub use config::Settings;
pub use dictionary::{
    ActivationReport, Dictionary, DictionaryError, ExternalDictionary, Item,
    PersistentDictionary, TrieDictionary, UpdateOutcome,
};
pub use source::{DictionarySource, Gathered};
pub use storage::{BatchLimits, BatchedStore, KvStore};
pub use trie::PrefixTrie;
