//! Search, update and preview commands.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{dictionary_paths, open_source, report_failures};
use crate::config::Settings;
use crate::dictionary::{Item, UpdateOutcome};

/// Arguments for the search command.
pub struct SearchArgs {
    pub prefix: String,
    pub paths: Vec<PathBuf>,
    pub show_path: bool,
    pub json: bool,
}

/// Run the search command.
pub async fn run(args: SearchArgs, settings: &Settings) -> Result<()> {
    let source = open_source(settings);
    let paths = dictionary_paths(args.paths, settings);
    if paths.is_empty() {
        eprintln!("No dictionaries given. Pass paths or set source.paths in settings.toml");
    }

    if let Some(report) = source.activate(&paths).await {
        report_failures(&report);
    }

    let show_path = args.show_path || settings.source.show_path;
    let items = source.search(&args.prefix, show_path).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            println!("{}", format_item(item));
        }
    }
    Ok(())
}

fn format_item(item: &Item) -> String {
    if item.info.is_empty() {
        item.word.clone()
    } else {
        format!("{}\t{}", item.word, item.info)
    }
}

/// Run the preview command.
pub async fn run_preview(word: String, info: String, settings: &Settings) -> Result<()> {
    let source = open_source(settings);
    let item = Item { word, info };
    for line in source.preview(&item).await? {
        println!("{line}");
    }
    Ok(())
}

/// Human-readable outcome of an update.
pub fn describe_outcome(path: &Path, outcome: UpdateOutcome) -> String {
    match outcome {
        UpdateOutcome::Rebuilt { words } => {
            format!("Indexed {}: {words} words", path.display())
        }
        UpdateOutcome::Fresh => format!("Up to date: {}", path.display()),
        UpdateOutcome::Skipped => {
            format!("Skipped {}: backend keeps no local index", path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_item() {
        let plain = Item {
            word: "apple".into(),
            info: String::new(),
        };
        let with_path = Item {
            word: "apple".into(),
            info: "/dicts/en.txt".into(),
        };
        assert_eq!(format_item(&plain), "apple");
        assert_eq!(format_item(&with_path), "apple\t/dicts/en.txt");
    }

    #[test]
    fn test_describe_outcome() {
        let path = Path::new("words.txt");
        assert_eq!(
            describe_outcome(path, UpdateOutcome::Rebuilt { words: 3 }),
            "Indexed words.txt: 3 words"
        );
        assert_eq!(
            describe_outcome(path, UpdateOutcome::Fresh),
            "Up to date: words.txt"
        );
    }
}
