//! Dictionary that delegates prefix search to an external program.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;

use super::{
    ActivationReport, Dictionary, DictionaryError, DictionaryResult, EntryStatus, Item,
    UpdateOutcome, unique_paths,
};
use crate::command::{CommandTemplate, split_lines};

/// Runs a command per active path, e.g. `look ${prefix} ${path}`.
///
/// No local index is kept, so `update` never reads anything.
#[derive(Debug)]
pub struct ExternalDictionary {
    command: CommandTemplate,
    paths: RwLock<Vec<PathBuf>>,
}

impl ExternalDictionary {
    pub fn new(command: CommandTemplate) -> Self {
        Self {
            command,
            paths: RwLock::new(Vec::new()),
        }
    }

    async fn search_path(&self, path: &Path, prefix: &str) -> DictionaryResult<Vec<String>> {
        let path_arg = path.to_string_lossy();
        let output = self
            .command
            .output(&[("prefix", prefix), ("path", path_arg.as_ref())])
            .await
            .map_err(|source| DictionaryError::Command {
                program: self.command.program().to_string(),
                source,
            })?;

        if !output.status.success() {
            crate::debug_event!(
                "external",
                "no matches",
                "{} exited with {} for {}",
                self.command.program(),
                output.status,
                path.display()
            );
            return Ok(Vec::new());
        }
        Ok(split_lines(&output.stdout))
    }
}

#[async_trait]
impl Dictionary for ExternalDictionary {
    fn name(&self) -> &str {
        "external"
    }

    async fn activate(&self, paths: &[PathBuf]) -> ActivationReport {
        let paths = unique_paths(paths);
        let mut current = self.paths.write();
        let deactivated = current.iter().filter(|path| !paths.contains(path)).count();
        *current = paths.clone();

        ActivationReport {
            fresh: paths,
            deactivated,
            ..Default::default()
        }
    }

    async fn update(&self, _path: &Path, _force: bool) -> DictionaryResult<UpdateOutcome> {
        Ok(UpdateOutcome::Skipped)
    }

    async fn search(&self, prefix: &str, show_path: bool) -> DictionaryResult<Vec<Item>> {
        let paths = self.paths.read().clone();
        let searches = paths.iter().map(|path| self.search_path(path, prefix));
        let results = join_all(searches).await;

        let mut items = Vec::new();
        for (path, words) in paths.iter().zip(results) {
            items.extend(
                words?
                    .into_iter()
                    .map(|word| Item::new(word, path, show_path)),
            );
        }
        Ok(items)
    }

    fn status(&self, path: &Path) -> Option<EntryStatus> {
        self.paths
            .read()
            .iter()
            .any(|active| active == path)
            .then_some(EntryStatus {
                mtime: super::reader::UNKNOWN_MTIME,
                active: true,
            })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn grep_dictionary() -> ExternalDictionary {
        let template: Vec<String> = ["grep", "-e", "^${prefix}", "${path}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        ExternalDictionary::new(CommandTemplate::new(&template).unwrap())
    }

    #[tokio::test]
    async fn test_search_runs_command_per_path() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, "apple\nbanana\n").unwrap();
        fs::write(&b, "apricot\n\ncherry\n").unwrap();

        let dictionary = grep_dictionary();
        let report = dictionary.activate(&[a.clone(), b.clone()]).await;
        assert_eq!(report.fresh.len(), 2);

        let items = dictionary.search("ap", true).await.unwrap();
        let found: Vec<(&str, &str)> = items
            .iter()
            .map(|item| (item.word.as_str(), item.info.as_str()))
            .collect();
        let a_info = a.display().to_string();
        let b_info = b.display().to_string();
        assert_eq!(
            found,
            vec![("apple", a_info.as_str()), ("apricot", b_info.as_str())]
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("words.txt");
        fs::write(&path, "apple\n").unwrap();

        let dictionary = grep_dictionary();
        dictionary.activate(std::slice::from_ref(&path)).await;
        assert!(dictionary.search("zzz", false).await.unwrap().is_empty());

        // grep exits with 2 for a missing file
        dictionary
            .activate(&[temp_dir.path().join("missing.txt")])
            .await;
        assert!(dictionary.search("a", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_replaces_paths() {
        let dictionary = grep_dictionary();
        let a = PathBuf::from("/dicts/a");
        let b = PathBuf::from("/dicts/b");

        dictionary.activate(&[a.clone(), b.clone()]).await;
        let report = dictionary.activate(std::slice::from_ref(&b)).await;

        assert_eq!(report.deactivated, 1);
        assert!(dictionary.status(&a).is_none());
        assert!(dictionary.status(&b).unwrap().active);
        assert_eq!(
            dictionary.update(&b, true).await.unwrap(),
            UpdateOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_command_error() {
        let template = vec!["lexicache-no-such-program".to_string()];
        let dictionary = ExternalDictionary::new(CommandTemplate::new(&template).unwrap());
        dictionary.activate(&[PathBuf::from("/dicts/a")]).await;

        let err = dictionary.search("a", false).await.unwrap_err();
        assert!(matches!(err, DictionaryError::Command { .. }));
    }
}
