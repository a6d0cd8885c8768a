use anyhow::Result;
use clap::Parser;

use lexicache::cli::commands::{init, search, serve, update};
use lexicache::cli::{Cli, Commands};
use lexicache::config::Settings;
use lexicache::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        Commands::Search {
            prefix,
            paths,
            show_path,
            json,
        } => {
            let args = search::SearchArgs {
                prefix,
                paths,
                show_path,
                json,
            };
            search::run(args, &settings).await
        }
        Commands::Update { path, force } => update::run(path, force, &settings).await,
        Commands::Preview { word, info } => search::run_preview(word, info, &settings).await,
        Commands::Serve { paths, watch } => {
            serve::run(serve::ServeArgs { paths, watch }, &settings).await
        }
    }
}
