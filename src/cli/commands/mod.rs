//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod init;
pub mod search;
pub mod serve;
pub mod update;

use std::path::PathBuf;

use crate::config::Settings;
use crate::dictionary::ActivationReport;
use crate::source::DictionarySource;

/// Paths given on the command line, or the configured ones.
pub fn dictionary_paths(cli_paths: Vec<PathBuf>, settings: &Settings) -> Vec<PathBuf> {
    if cli_paths.is_empty() {
        settings.source.paths.clone()
    } else {
        cli_paths
    }
}

/// Build the source, warning on stderr if the configured store was unusable.
pub fn open_source(settings: &Settings) -> DictionarySource {
    let source = DictionarySource::from_settings(settings);
    if let Some(e) = source.startup_error() {
        eprintln!("Warning: {e}");
        eprintln!("Falling back to the in-memory dictionary.");
    }
    source
}

/// Print per-path failures of an activation.
pub fn report_failures(report: &ActivationReport) {
    for (path, e) in &report.failed {
        eprintln!("Warning: skipped {}: {e}", path.display());
    }
}
