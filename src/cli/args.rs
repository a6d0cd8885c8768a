//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Prefix completion over dictionary files
#[derive(Parser)]
#[command(
    name = "lexicache",
    version = env!("CARGO_PKG_VERSION"),
    about = "Prefix completion over dictionary files",
    long_about = "Index word lists and answer prefix queries, caching indexes in memory or in a persistent store.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .lexicache directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .lexicache/settings.toml")]
    Config,

    /// Look up words by prefix
    #[command(
        about = "Print dictionary words starting with a prefix",
        after_help = "Examples:\n  lexicache search ap /usr/share/dict/words\n  lexicache search Ap --show-path\n  lexicache search ap --json"
    )]
    Search {
        /// Literal, case-sensitive prefix
        prefix: String,

        /// Dictionary files (defaults to source.paths from settings)
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Print the originating dictionary next to each word
        #[arg(long)]
        show_path: bool,

        /// Output JSON instead of one word per line
        #[arg(long)]
        json: bool,
    },

    /// (Re)index a single dictionary
    #[command(about = "Bring the index for one dictionary up to date")]
    Update {
        /// Dictionary file
        path: PathBuf,

        /// Rebuild even if the file is unchanged
        #[arg(short, long)]
        force: bool,
    },

    /// Show the preview document for a word
    #[command(about = "Run the configured document_command for a word")]
    Preview {
        /// Word to document
        word: String,

        /// Info text shown above the command output
        #[arg(long, default_value = "")]
        info: String,
    },

    /// Answer completion requests from stdin
    #[command(
        about = "Gather candidates for each input line on stdin",
        after_help = "Input lines:\n  <TEXT>                  gather candidates for TEXT\n  :paths <PATH>...        replace the watch set\n  :update <PATH>          force a rebuild of PATH\n  :preview <WORD> [PATH]  show the preview document for WORD\n\nEach request produces one JSON line on stdout."
    )]
    Serve {
        /// Dictionary files (defaults to source.paths from settings)
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Re-index dictionaries when they change on disk
        #[arg(short, long)]
        watch: bool,
    },
}
