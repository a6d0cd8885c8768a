//! Completion source: picks a dictionary backend and turns typed input into
//! candidates.
//!
//! The source owns the watch set. A new path list triggers an activation
//! only when it differs from the last accepted one, and at most one
//! activation runs at a time; a request arriving meanwhile is dropped
//! rather than queued.

pub mod case;

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;

use crate::command::{CommandTemplate, split_lines};
use crate::config::{Settings, SourceConfig};
use crate::dictionary::{
    ActivationReport, Dictionary, DictionaryError, DictionaryResult, ExternalDictionary, Item,
    PersistentDictionary, TrieDictionary, UpdateOutcome,
};
use case::{capitalize, decapitalize, starts_uppercase, truncate_chars};

/// Candidates for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gathered {
    pub items: Vec<Item>,
    /// Input was shorter than the query prefix length; callers should
    /// gather again as the user keeps typing.
    pub is_incomplete: bool,
}

pub struct DictionarySource {
    dictionary: Box<dyn Dictionary>,
    config: SourceConfig,
    document_command: Option<CommandTemplate>,
    prev_paths: Mutex<Vec<PathBuf>>,
    activation: tokio::sync::Mutex<()>,
    startup_error: Option<DictionaryError>,
}

impl std::fmt::Debug for DictionarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionarySource")
            .field("dictionary", &self.dictionary.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DictionarySource {
    /// Select a backend from settings.
    ///
    /// A configured database wins over an external command; with neither,
    /// words are indexed in memory. A database that cannot be opened is
    /// logged and replaced by the in-memory backend.
    pub fn from_settings(settings: &Settings) -> Self {
        let config = settings.source.clone();
        let mut startup_error = None;

        let dictionary: Box<dyn Dictionary> = if let Some(path) = config.database_path() {
            match PersistentDictionary::open(path, settings.store) {
                Ok(dictionary) => Box::new(dictionary),
                Err(e) => {
                    tracing::error!(
                        "[source] Failed to open database_path {}: {e}",
                        path.display()
                    );
                    startup_error = Some(e);
                    Box::new(TrieDictionary::new())
                }
            }
        } else if let Some(command) = CommandTemplate::new(&config.external_command) {
            Box::new(ExternalDictionary::new(command))
        } else {
            Box::new(TrieDictionary::new())
        };

        crate::debug_event!("source", "selected", "{}", dictionary.name());
        let mut source = Self::with_dictionary(dictionary, config);
        source.startup_error = startup_error;
        source
    }

    /// Use an explicit backend.
    pub fn with_dictionary(dictionary: Box<dyn Dictionary>, config: SourceConfig) -> Self {
        Self {
            document_command: CommandTemplate::new(&config.document_command),
            dictionary,
            config,
            prev_paths: Mutex::new(Vec::new()),
            activation: tokio::sync::Mutex::new(()),
            startup_error: None,
        }
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dictionary.as_ref()
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Error that forced the fallback backend, if any.
    pub fn startup_error(&self) -> Option<&DictionaryError> {
        self.startup_error.as_ref()
    }

    /// Paths of the last accepted activation.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        self.prev_paths.lock().clone()
    }

    /// Activate `paths` if they differ from the current watch set.
    pub async fn on_event(&self, paths: &[PathBuf]) -> Option<ActivationReport> {
        if self.prev_paths.lock().as_slice() == paths {
            return None;
        }
        self.activate(paths).await
    }

    /// Replace the watch set, unless another activation is in flight.
    ///
    /// Returns `None` when the call was dropped.
    pub async fn activate(&self, paths: &[PathBuf]) -> Option<ActivationReport> {
        let Ok(_guard) = self.activation.try_lock() else {
            crate::debug_event!("source", "activation dropped", "{} paths", paths.len());
            return None;
        };

        *self.prev_paths.lock() = paths.to_vec();
        let report = self.dictionary.activate(paths).await;
        Some(report)
    }

    pub async fn search(&self, prefix: &str, show_path: bool) -> DictionaryResult<Vec<Item>> {
        self.dictionary.search(prefix, show_path).await
    }

    /// Candidates for the word being typed.
    ///
    /// Only the first `exact_length` characters are used as the query. With
    /// `first_case_insensitive`, matches for the literal prefix come first,
    /// followed by matches for the prefix with its first letter's case
    /// flipped, re-cased to follow the input. Duplicates are kept.
    pub async fn gather(&self, complete_str: &str) -> DictionaryResult<Gathered> {
        let exact_length = self.config.exact_length;
        let show_path = self.config.show_path;
        let prefix = truncate_chars(complete_str, exact_length);

        let mut items = self.search(prefix, show_path).await?;
        if self.config.first_case_insensitive {
            let capital = starts_uppercase(prefix);
            let flipped = if capital {
                decapitalize(prefix)
            } else {
                capitalize(prefix)
            };
            let extra = self.search(&flipped, show_path).await?;
            items.extend(extra.into_iter().map(|item| Item {
                word: if capital {
                    capitalize(&item.word)
                } else {
                    decapitalize(&item.word)
                },
                info: item.info,
            }));
        }

        Ok(Gathered {
            items,
            is_incomplete: complete_str.chars().count() < exact_length,
        })
    }

    /// Preview lines for `item`: its info, then the documentation command's
    /// output.
    ///
    /// When the command writes nothing to stdout, its stderr is shown after
    /// an `Error:` line.
    pub async fn preview(&self, item: &Item) -> DictionaryResult<Vec<String>> {
        let mut contents = Vec::new();
        if !item.info.is_empty() {
            contents.push(item.info.clone());
        }

        let Some(command) = &self.document_command else {
            return Ok(contents);
        };
        let vars = [
            ("item.word", item.word.as_str()),
            ("item.info", item.info.as_str()),
            ("word", item.word.as_str()),
            ("path", item.info.as_str()),
        ];
        let output = command
            .output(&vars)
            .await
            .map_err(|source| DictionaryError::Command {
                program: command.program().to_string(),
                source,
            })?;

        if !output.stdout.is_empty() {
            contents.extend(split_lines(&output.stdout));
        } else if !output.stderr.is_empty() {
            contents.push("Error:".to_string());
            contents.extend(split_lines(&output.stderr));
        }
        Ok(contents)
    }

    /// Rebuild `path` regardless of its recorded modification time.
    pub async fn force_update(&self, path: &Path) -> DictionaryResult<UpdateOutcome> {
        let outcome = self.dictionary.update(path, true).await?;
        crate::log_event!("source", "updated", "{}", path.display());
        Ok(outcome)
    }

    /// Re-check a watched path after it changed on disk.
    ///
    /// Paths outside the current watch set are ignored so a stale watcher
    /// event cannot reactivate them.
    pub async fn refresh(&self, path: &Path) -> DictionaryResult<Option<UpdateOutcome>> {
        if !self.prev_paths.lock().iter().any(|watched| watched == path) {
            return Ok(None);
        }
        self.dictionary.update(path, false).await.map(Some)
    }
}
