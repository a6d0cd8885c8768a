//! File watching for dictionary files.
//!
//! # Architecture
//!
//! ```text
//! DictionaryWatcher
//!   - Single notify::RecommendedWatcher on parent directories
//!   - PathRegistry (event path -> configured path)
//!   - ChangeQueue (settles bursts of events per dictionary)
//!         |
//!   DictionarySource::refresh(path)
//! ```

mod dictionary;
mod error;
mod path_registry;

pub use dictionary::DictionaryWatcher;
pub use error::WatchError;
pub use path_registry::PathRegistry;
