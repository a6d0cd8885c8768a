//! Error types for dictionary operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StoreError;

/// Errors from indexing, searching, and opening dictionaries.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Cannot read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store operation failed for {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Failed to open database {path}: {source}")]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("Failed to run command '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl DictionaryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn store(path: impl Into<PathBuf>, source: StoreError) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying on the next update cycle may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Store { .. })
    }
}

pub type DictionaryResult<T> = Result<T, DictionaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_per_path_failures_are_retryable() {
        let io = DictionaryError::io("words.txt", std::io::Error::other("gone"));
        assert!(io.is_retryable());

        let command = DictionaryError::Command {
            program: "look".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!command.is_retryable());
    }
}
