//! Initialize a new Cinegraph project.

use anyhow::{Context, Result};
use cinegraph::config::{GraphBackend, CONFIG_FILE};
use cinegraph::rag::MovieSeed;
use cinegraph::Config;
use colored::Colorize;
use std::path::PathBuf;

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Cinegraph project...", "→".blue());

    let data_dir = base_path.join("data");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    println!("  {} Created {}", "✓".green(), data_dir.display());

    // Starts on the bundled sample graph; point [graph] at Neo4j later
    let mut config = Config::default();
    config.graph.backend = GraphBackend::Memory;

    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        config.save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    let seed_path = base_path.join(&config.graph.seed);
    if !seed_path.exists() {
        let json = serde_json::to_string_pretty(&sample_seeds())?;
        std::fs::write(&seed_path, json)
            .with_context(|| format!("Failed to write {}", seed_path.display()))?;
        println!("  {} Created {}", "✓".green(), seed_path.display());
    }

    let gitignore_path = data_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(
            &gitignore_path,
            format!("{}\n{}\n", config.index.index_file, config.index.entries_file),
        )?;
        println!("  {} Created {}", "✓".green(), gitignore_path.display());
    }

    println!();
    println!("{} Cinegraph project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} cinegraph build-index", "1.".blue());
    println!("  {} cinegraph ask \"Who directed Inception?\"", "2.".blue());
    println!("  {} cinegraph stats", "3.".blue());

    Ok(())
}

fn sample_seeds() -> Vec<MovieSeed> {
    vec![
        MovieSeed::new("inception")
            .with_title("Inception")
            .with_year(2010)
            .with_plot("A thief who steals secrets through dream-sharing is asked to plant an idea instead.")
            .with_directors(&["Christopher Nolan"])
            .with_actors(&["Leonardo DiCaprio", "Joseph Gordon-Levitt", "Elliot Page"])
            .with_genres(&["Action", "Sci-Fi"])
            .with_languages(&["English", "Japanese"])
            .with_countries(&["USA", "UK"])
            .with_rating("1", "Ann", 4.5)
            .with_rating("2", "Ben", 5.0),
        MovieSeed::new("heat")
            .with_title("Heat")
            .with_year(1995)
            .with_plot("A detective hunts a crew of professional thieves in Los Angeles.")
            .with_directors(&["Michael Mann"])
            .with_actors(&["Al Pacino", "Robert De Niro", "Val Kilmer"])
            .with_genres(&["Crime", "Thriller"])
            .with_languages(&["English"])
            .with_countries(&["USA"])
            .with_rating("1", "Ann", 4.0)
            .with_rating("3", "Cleo", 4.5),
        MovieSeed::new("toy-story")
            .with_title("Toy Story")
            .with_year(1995)
            .with_plot("A cowboy doll feels threatened when a space ranger becomes the favorite toy.")
            .with_directors(&["John Lasseter"])
            .with_actors(&["Tom Hanks", "Tim Allen"])
            .with_genres(&["Animation", "Comedy"])
            .with_languages(&["English"])
            .with_countries(&["USA"])
            .with_rating("2", "Ben", 3.5),
        MovieSeed::new("amelie")
            .with_title("Amélie")
            .with_year(2001)
            .with_plot("A shy waitress in Paris decides to change the lives of those around her.")
            .with_directors(&["Jean-Pierre Jeunet"])
            .with_actors(&["Audrey Tautou", "Mathieu Kassovitz"])
            .with_genres(&["Comedy", "Romance"])
            .with_languages(&["French"])
            .with_countries(&["France"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegraph::rag::MemoryGraphStore;

    #[test]
    fn test_init_writes_project_files() {
        let dir = tempfile::tempdir().unwrap();
        run(Some(dir.path().to_path_buf())).unwrap();

        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.graph.backend, GraphBackend::Memory);

        let store = MemoryGraphStore::from_seed_file(dir.path().join("data/movies.json")).unwrap();
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE);
        std::fs::write(&config_path, "[server]\nport = 9100\n").unwrap();

        run(Some(dir.path().to_path_buf())).unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert_eq!(content, "[server]\nport = 9100\n");
    }
}
