//! Rebuild the vector index.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::load_config;

pub async fn run(config_path: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let config = load_config(config_path)?;
    let paths = config.index.paths();

    println!(
        "{} Building index from {:?} graph store...",
        "→".blue(),
        config.graph.backend
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} movies")?
            .progress_chars("#>-"),
    );
    let progress = pb.clone();

    let started = Instant::now();
    let index = cinegraph::build_index(
        &config,
        limit,
        Some(Arc::new(move |done: usize, total: usize| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        })),
    )
    .await?;
    pb.finish_and_clear();

    println!(
        "{} Indexed {} movies ({} dimensions, {}) in {:.1}s",
        "✓".green(),
        index.len().to_string().cyan(),
        index.index().dimension(),
        index.index().metric().as_str(),
        started.elapsed().as_secs_f64()
    );
    println!("  {} {}", "•".dimmed(), paths.index.display());
    println!("  {} {}", "•".dimmed(), paths.entries.display());

    Ok(())
}
