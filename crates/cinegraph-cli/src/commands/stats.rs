//! Show index statistics.

use anyhow::{bail, Result};
use cinegraph::vectors::PersistedIndex;
use colored::Colorize;
use std::path::Path;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let paths = config.index.paths();

    if !paths.exists() {
        bail!("No index found. Run {} first.", "cinegraph build-index".cyan());
    }

    let index = PersistedIndex::load(&paths)?;
    let index_bytes = std::fs::metadata(&paths.index)?.len();
    let entries_bytes = std::fs::metadata(&paths.entries)?.len();

    let titled = index
        .entries()
        .iter()
        .filter(|e| e.attributes.contains_key("title"))
        .count();

    println!("{}", "Cinegraph Index Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Vector Index".blue().bold());
    println!("  Vectors:           {}", index.len().to_string().cyan());
    println!(
        "  Dimension:         {}",
        index.index().dimension().to_string().cyan()
    );
    println!("  Metric:            {}", index.index().metric().as_str());
    println!("  Index file:        {} ({} bytes)", paths.index.display(), index_bytes);
    println!(
        "  Entry list:        {} ({} bytes)",
        paths.entries.display(),
        entries_bytes
    );
    println!("  Titled entries:    {}", titled);
    println!();

    println!("{}", "Collaborators".blue().bold());
    println!("  Graph store:       {:?}", config.graph.backend);
    println!("  Embedding:         {:?}", config.embedding.provider);
    println!("  LLM:               {:?}", config.llm.provider);
    println!(
        "  Retrieval:         k={} cutoff={}",
        config.retrieval.k, config.retrieval.min_similarity
    );

    println!();
    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}
