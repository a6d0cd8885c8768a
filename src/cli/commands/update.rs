//! Update command - (re)index one dictionary.
//!
//! Mostly useful with a persistent store, where the result outlives the
//! process.

use std::path::PathBuf;

use anyhow::Result;

use super::open_source;
use super::search::describe_outcome;
use crate::config::Settings;

/// Run the update command.
pub async fn run(path: PathBuf, force: bool, settings: &Settings) -> Result<()> {
    let source = open_source(settings);

    let outcome = if force {
        source.force_update(&path).await?
    } else {
        source.dictionary().update(&path, false).await?
    };

    println!("{}", describe_outcome(&path, outcome));
    if let Some(db) = settings.source.database_path() {
        if source.startup_error().is_none() {
            println!("Database: {}", db.display());
        }
    }
    Ok(())
}
