//! Completion source behaviour through settings-driven backend selection

use lexicache::{DictionarySource, Settings};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn dictionary(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("dict1.txt");
    fs::write(&path, "apple\nApricot\nbanana\nband").unwrap();
    path
}

fn words(gathered: &lexicache::Gathered) -> Vec<&str> {
    gathered.items.iter().map(|item| item.word.as_str()).collect()
}

#[tokio::test]
async fn test_case_insensitive_gather_on_persistent_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = dictionary(&temp_dir);

    let mut settings = Settings::default();
    settings.source.first_case_insensitive = true;
    settings.source.database_path = temp_dir.path().join("db").join("dict.redb");
    let source = DictionarySource::from_settings(&settings);
    assert_eq!(source.dictionary().name(), "persistent");

    let report = source.on_event(&[path]).await.unwrap();
    assert!(report.is_success());

    let gathered = source.gather("Ap").await.unwrap();
    assert_eq!(words(&gathered), vec!["Apricot", "Apple"]);

    let gathered = source.gather("apple").await.unwrap();
    assert_eq!(words(&gathered), vec!["apple", "apricot"]);
}

#[tokio::test]
async fn test_exact_length_controls_query() {
    let temp_dir = TempDir::new().unwrap();
    let path = dictionary(&temp_dir);

    let mut settings = Settings::default();
    settings.source.exact_length = 4;
    settings.source.paths = vec![path.clone()];
    let source = DictionarySource::from_settings(&settings);
    source.activate(&settings.source.paths).await.unwrap();

    let gathered = source.gather("bandana").await.unwrap();
    assert_eq!(words(&gathered), vec!["band"]);
    assert!(!gathered.is_incomplete);

    let gathered = source.gather("ban").await.unwrap();
    assert_eq!(words(&gathered), vec!["banana", "band"]);
    assert!(gathered.is_incomplete);
}

#[tokio::test]
async fn test_failed_path_does_not_hide_others() {
    let temp_dir = TempDir::new().unwrap();
    let path = dictionary(&temp_dir);
    let missing = temp_dir.path().join("missing.txt");

    let source = DictionarySource::from_settings(&Settings::default());
    let report = source.activate(&[missing.clone(), path]).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert_eq!(words(&source.gather("ba").await.unwrap()), vec!["banana", "band"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_command_backend() {
    let temp_dir = TempDir::new().unwrap();
    let path = dictionary(&temp_dir);

    let mut settings = Settings::default();
    settings.source.show_path = true;
    settings.source.external_command = vec![
        "grep".to_string(),
        "-e".to_string(),
        "^${prefix}".to_string(),
        "${path}".to_string(),
    ];
    let source = DictionarySource::from_settings(&settings);
    assert_eq!(source.dictionary().name(), "external");
    source.activate(std::slice::from_ref(&path)).await.unwrap();

    let gathered = source.gather("ban").await.unwrap();
    assert_eq!(words(&gathered), vec!["banana", "band"]);
    assert_eq!(gathered.items[0].info, path.display().to_string());
}
