//! Serve command - line-oriented completion loop over stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::search::describe_outcome;
use super::{dictionary_paths, open_source};
use crate::config::Settings;
use crate::dictionary::{ActivationReport, Item};
use crate::source::DictionarySource;
use crate::watcher::DictionaryWatcher;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub paths: Vec<PathBuf>,
    pub watch: bool,
}

/// One input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    Gather(String),
    Paths(Vec<PathBuf>),
    Update(PathBuf),
    /// `:preview <word> [path]`; the path becomes the item's info.
    Preview { word: String, info: String },
}

impl Request {
    /// Parse a line; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let Some(command) = line.strip_prefix(':') else {
            return Some(Request::Gather(line.trim().to_string()));
        };
        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let rest = rest.trim();
        match name {
            "paths" => Some(Request::Paths(
                rest.split_whitespace().map(PathBuf::from).collect(),
            )),
            "update" if !rest.is_empty() => Some(Request::Update(PathBuf::from(rest))),
            "preview" if !rest.is_empty() => {
                let (word, info) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Some(Request::Preview {
                    word: word.to_string(),
                    info: info.trim().to_string(),
                })
            }
            _ => Some(Request::Gather(line.trim().to_string())),
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, settings: &Settings) -> Result<()> {
    let source = Arc::new(open_source(settings));
    let paths = dictionary_paths(args.paths, settings);

    if let Some(report) = source.activate(&paths).await {
        super::report_failures(&report);
    }

    let watcher_task = if args.watch {
        let watcher = DictionaryWatcher::new(Arc::clone(&source), settings.watch.debounce_ms)?;
        Some(tokio::spawn(async move {
            if let Err(e) = watcher.watch().await {
                tracing::error!("[watcher] stopped: {e}");
            }
        }))
    } else {
        None
    };

    crate::log_event!("serve", "ready", "{} dictionaries", paths.len());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let Some(request) = Request::parse(&line) else {
            continue;
        };
        let response = handle(&source, request).await;
        stdout.write_all(format!("{response}\n").as_bytes()).await?;
        stdout.flush().await?;
    }

    if let Some(task) = watcher_task {
        task.abort();
    }
    Ok(())
}

/// Answer one request as a JSON value.
pub async fn handle(source: &DictionarySource, request: Request) -> Value {
    match request {
        Request::Gather(input) => match source.gather(&input).await {
            Ok(gathered) => json!(gathered),
            Err(e) => json!({ "error": e.to_string() }),
        },
        Request::Paths(paths) => match source.on_event(&paths).await {
            Some(report) => activation_json(&report),
            None => json!({ "activated": false }),
        },
        Request::Update(path) => match source.force_update(&path).await {
            Ok(outcome) => json!({ "updated": describe_outcome(&path, outcome) }),
            Err(e) => json!({ "error": e.to_string() }),
        },
        Request::Preview { word, info } => {
            let item = Item { word, info };
            match source.preview(&item).await {
                Ok(contents) => json!({ "contents": contents }),
                Err(e) => json!({ "error": e.to_string() }),
            }
        }
    }
}

fn activation_json(report: &ActivationReport) -> Value {
    let failed: Vec<Value> = report
        .failed
        .iter()
        .map(|(path, e)| json!({ "path": path, "error": e.to_string() }))
        .collect();
    json!({
        "activated": true,
        "fresh": report.fresh.len(),
        "rebuilt": report.rebuilt.len(),
        "deactivated": report.deactivated,
        "failed": failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::dictionary::TrieDictionary;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_requests() {
        assert_eq!(Request::parse("  \r\n"), None);
        assert_eq!(Request::parse("ap"), Some(Request::Gather("ap".into())));
        assert_eq!(
            Request::parse(":paths a.txt  b.txt"),
            Some(Request::Paths(vec!["a.txt".into(), "b.txt".into()]))
        );
        assert_eq!(Request::parse(":paths"), Some(Request::Paths(Vec::new())));
        assert_eq!(
            Request::parse(":update words.txt"),
            Some(Request::Update("words.txt".into()))
        );
        assert_eq!(
            Request::parse(":preview apple"),
            Some(Request::Preview {
                word: "apple".into(),
                info: String::new(),
            })
        );
        assert_eq!(
            Request::parse(":preview apple  /dicts/en.txt"),
            Some(Request::Preview {
                word: "apple".into(),
                info: "/dicts/en.txt".into(),
            })
        );
        assert_eq!(Request::parse(":update"), Some(Request::Gather(":update".into())));
    }

    #[tokio::test]
    async fn test_handle_paths_then_gather() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("words.txt");
        fs::write(&path, "apple apricot banana").unwrap();
        let source =
            DictionarySource::with_dictionary(Box::new(TrieDictionary::new()), SourceConfig::default());

        let response = handle(&source, Request::Paths(vec![path.clone()])).await;
        assert_eq!(response["activated"], true);
        assert_eq!(response["rebuilt"], 1);

        let response = handle(&source, Request::Paths(vec![path])).await;
        assert_eq!(response["activated"], false);

        // Only the first two characters are used as the query.
        let response = handle(&source, Request::Gather("apr".into())).await;
        assert_eq!(response["items"][0]["word"], "apple");
        assert_eq!(response["items"][1]["word"], "apricot");
        assert_eq!(response["is_incomplete"], false);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handle_preview_passes_path() {
        let source = DictionarySource::with_dictionary(
            Box::new(TrieDictionary::new()),
            SourceConfig {
                document_command: vec!["echo".into(), "${word}".into(), "from ${path}".into()],
                ..SourceConfig::default()
            },
        );

        let request = Request::parse(":preview apple /dicts/en.txt").unwrap();
        let response = handle(&source, request).await;
        assert_eq!(
            response["contents"],
            json!(["/dicts/en.txt", "apple from /dicts/en.txt"])
        );
    }
}
