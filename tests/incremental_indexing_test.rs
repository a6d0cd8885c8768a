//! Tests for incremental indexing across the cache-backed dictionaries

use lexicache::{BatchLimits, Dictionary, PersistentDictionary, TrieDictionary, UpdateOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn backends(temp_dir: &TempDir) -> Vec<Box<dyn Dictionary>> {
    let database = temp_dir.path().join("index").join("dict.redb");
    vec![
        Box::new(TrieDictionary::new()),
        Box::new(PersistentDictionary::open(&database, BatchLimits::default()).unwrap()),
    ]
}

fn touch(path: &Path, offset_secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
}

async fn words(dictionary: &dyn Dictionary, prefix: &str) -> Vec<String> {
    dictionary
        .search(prefix, false)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.word)
        .collect()
}

#[tokio::test]
async fn test_lookup_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dict1.txt");
    fs::write(&path, "apple\nApricot\nbanana").unwrap();

    for dictionary in backends(&temp_dir) {
        dictionary.update(&path, false).await.unwrap();

        assert_eq!(words(dictionary.as_ref(), "ap").await, vec!["apple"], "{}", dictionary.name());
        assert_eq!(words(dictionary.as_ref(), "Ap").await, vec!["Apricot"]);
        assert_eq!(
            words(dictionary.as_ref(), "").await,
            vec!["Apricot", "apple", "banana"]
        );
        assert!(words(dictionary.as_ref(), "cherry").await.is_empty());
    }
}

#[tokio::test]
async fn test_unchanged_file_is_read_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("words.txt");
    fs::write(&path, "one two two three").unwrap();

    for dictionary in backends(&temp_dir) {
        assert_eq!(
            dictionary.update(&path, false).await.unwrap(),
            UpdateOutcome::Rebuilt { words: 3 }
        );
        assert_eq!(
            dictionary.update(&path, false).await.unwrap(),
            UpdateOutcome::Fresh
        );

        let stats = dictionary.stats();
        assert_eq!(stats.files_read, 1, "{}", dictionary.name());
        assert_eq!(stats.words_indexed, 3);
    }
}

#[tokio::test]
async fn test_modified_file_is_reindexed() {
    let temp_dir = TempDir::new().unwrap();

    for (i, dictionary) in backends(&temp_dir).into_iter().enumerate() {
        let path = temp_dir.path().join(format!("words{i}.txt"));
        fs::write(&path, "before").unwrap();
        dictionary.update(&path, false).await.unwrap();

        fs::write(&path, "after").unwrap();
        touch(&path, 5);
        assert_eq!(
            dictionary.update(&path, false).await.unwrap(),
            UpdateOutcome::Rebuilt { words: 1 }
        );
        assert_eq!(words(dictionary.as_ref(), "").await, vec!["after"]);
    }
}

#[tokio::test]
async fn test_watch_set_changes() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.txt");
    let b = temp_dir.path().join("b.txt");
    fs::write(&a, "alpha").unwrap();
    fs::write(&b, "beta").unwrap();
    let both: Vec<PathBuf> = vec![a.clone(), b.clone()];

    for dictionary in backends(&temp_dir) {
        let report = dictionary.activate(&both).await;
        assert!(report.is_success());
        assert_eq!(report.rebuilt.len(), 2);

        let report = dictionary.activate(std::slice::from_ref(&b)).await;
        assert_eq!(report.deactivated, 1);
        assert_eq!(words(dictionary.as_ref(), "").await, vec!["beta"]);
        let status = dictionary.status(&a).unwrap();
        assert!(!status.active);

        let report = dictionary.activate(&both).await;
        assert_eq!(report.fresh.len(), 2);
        assert_eq!(dictionary.stats().files_read, 2, "{}", dictionary.name());
        assert_eq!(words(dictionary.as_ref(), "").await.len(), 2);
    }
}

#[tokio::test]
async fn test_duplicate_paths_are_indexed_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("words.txt");
    fs::write(&path, "only").unwrap();

    for dictionary in backends(&temp_dir) {
        let report = dictionary.activate(&[path.clone(), path.clone()]).await;
        assert_eq!(report.rebuilt.len() + report.fresh.len(), 1);
        assert_eq!(words(dictionary.as_ref(), "o").await, vec!["only"]);
    }
}

#[tokio::test]
async fn test_persistent_index_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let database = temp_dir.path().join("dict.redb");
    let path = temp_dir.path().join("words.txt");
    let vocabulary: Vec<String> = (0..3000).map(|i| format!("w{i:05}")).collect();
    fs::write(&path, vocabulary.join(" ")).unwrap();

    {
        let dictionary = PersistentDictionary::open(&database, BatchLimits::default()).unwrap();
        dictionary.activate(std::slice::from_ref(&path)).await;
    }

    let dictionary = PersistentDictionary::open(&database, BatchLimits::default()).unwrap();
    let report = dictionary.activate(std::slice::from_ref(&path)).await;
    assert_eq!(report.fresh, vec![path.clone()]);
    assert_eq!(dictionary.stats().files_read, 0);

    let found = words(&dictionary, "w012").await;
    assert_eq!(found.len(), 10);
    assert_eq!(found[0], "w01200");
    assert_eq!(words(&dictionary, "").await.len(), 3000);
}
