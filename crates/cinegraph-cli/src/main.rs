//! Cinegraph CLI - Ask questions of a movie knowledge graph.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "cinegraph")]
#[command(author, version, about = "Cinegraph - Graph-augmented answers over a movie graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: cinegraph.toml in current or parent directories)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Cinegraph project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Rebuild the vector index from the graph store
    BuildIndex {
        /// Maximum number of movies to index
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Ask a question
    Ask {
        /// The question
        query: String,

        /// Print the full answer with its context as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the nearest movies for a query
    Search {
        /// Search query
        query: String,

        /// Maximum results to return
        #[arg(short, default_value = "10")]
        k: usize,
    },

    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::BuildIndex { limit } => commands::build_index::run(config_path, limit).await,
        Commands::Ask { query, json } => commands::ask::run(config_path, &query, json).await,
        Commands::Search { query, k } => commands::search::run(config_path, &query, k).await,
        Commands::Stats => commands::stats::run(config_path),
    }
}
