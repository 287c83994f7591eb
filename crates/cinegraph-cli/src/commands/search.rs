//! Nearest movies for a query.

use anyhow::Result;
use cinegraph::AppContext;
use colored::Colorize;
use std::path::Path;

use super::load_config;

pub async fn run(config_path: Option<&Path>, query: &str, k: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = AppContext::open(config).await?;

    let result = ctx.rag().search(query, k).await;
    let metric = ctx.rag().retriever().metric();
    ctx.close().await;
    let hits = result?;

    if hits.is_empty() {
        println!("{} No matches for \"{}\"", "•".yellow(), query);
        return Ok(());
    }

    println!(
        "{} {} matches for \"{}\" ({})",
        "→".blue(),
        hits.len().to_string().cyan(),
        query,
        metric.as_str()
    );
    println!();

    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "  {:>2}. {:<40} {:.4}  {}",
            rank + 1,
            hit.title.as_deref().unwrap_or("(untitled)"),
            hit.score,
            hit.id.dimmed()
        );
    }

    Ok(())
}
