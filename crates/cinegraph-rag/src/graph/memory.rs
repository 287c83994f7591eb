//! In-process graph store backed by petgraph.
//!
//! Mirrors the recommendations schema: people point at movies through
//! `ACTED_IN`/`DIRECTED`, users through `RATED`, and movies point at their
//! genre, language and country nodes.

use super::{FetchOptions, GraphStore};
use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use cinegraph_core::{MovieId, MovieRecord, Rater, RatingStats, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// A year may be stored as a number or as free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    Number(i64),
    Text(String),
}

impl YearValue {
    fn render(&self) -> String {
        match self {
            YearValue::Number(n) => n.to_string(),
            YearValue::Text(s) => s.clone(),
        }
    }
}

/// One rating edge in a seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSeed {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub rating: f64,
}

/// One movie with its relationships, as written in a seed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieSeed {
    pub id: String,
    pub title: Option<String>,
    pub year: Option<YearValue>,
    pub plot: Option<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
    pub ratings: Vec<RatingSeed>,
}

impl MovieSeed {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(YearValue::Number(year));
        self
    }

    pub fn with_plot(mut self, plot: &str) -> Self {
        self.plot = Some(plot.to_string());
        self
    }

    pub fn with_actors(mut self, actors: &[&str]) -> Self {
        self.actors = actors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_directors(mut self, directors: &[&str]) -> Self {
        self.directors = directors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_genres(mut self, genres: &[&str]) -> Self {
        self.genres = genres.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_countries(mut self, countries: &[&str]) -> Self {
        self.countries = countries.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_rating(mut self, user_id: &str, name: &str, rating: f64) -> Self {
        self.ratings.push(RatingSeed {
            user_id: user_id.to_string(),
            name: Some(name.to_string()),
            rating,
        });
        self
    }
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    movies: Vec<MovieSeed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKind {
    Person,
    Genre,
    Language,
    Country,
    User,
}

#[derive(Debug, Clone)]
enum GraphNode {
    Movie {
        id: MovieId,
        title: Option<String>,
        year: Option<String>,
        plot: Option<String>,
    },
    Named {
        kind: NodeKind,
        key: String,
        name: Option<String>,
    },
}

impl GraphNode {
    fn display_name(&self) -> Option<&str> {
        match self {
            GraphNode::Movie { title, .. } => title.as_deref(),
            GraphNode::Named { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EdgeData {
    relation: Relation,
    rating: Option<f64>,
}

/// Petgraph-backed implementation of [`GraphStore`].
pub struct MemoryGraphStore {
    graph: DiGraph<GraphNode, EdgeData>,
    /// Map from movie id to petgraph's internal index.
    movies: HashMap<MovieId, NodeIndex>,
    /// Insertion order, used for scans.
    order: Vec<MovieId>,
    named: HashMap<(NodeKind, String), NodeIndex>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            movies: HashMap::new(),
            order: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Build a store from seed records.
    pub fn from_seeds(seeds: impl IntoIterator<Item = MovieSeed>) -> GraphResult<Self> {
        let mut store = Self::new();
        for seed in seeds {
            store.insert(seed)?;
        }
        Ok(store)
    }

    /// Parse a `{"movies": [...]}` document.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let file: SeedFile =
            serde_json::from_str(json).map_err(|e| GraphError::InvalidSeed(e.to_string()))?;
        Self::from_seeds(file.movies)
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json(&json)?;
        info!(movies = store.len(), seed = %path.display(), "Loaded in-memory graph");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Add a movie and its relationships. Ids must be unique.
    pub fn insert(&mut self, seed: MovieSeed) -> GraphResult<()> {
        if seed.id.trim().is_empty() {
            return Err(GraphError::InvalidSeed("movie without id".to_string()));
        }
        if self.movies.contains_key(&seed.id) {
            return Err(GraphError::InvalidSeed(format!("duplicate movie id {}", seed.id)));
        }

        let movie = self.graph.add_node(GraphNode::Movie {
            id: seed.id.clone(),
            title: seed.title,
            year: seed.year.map(|y| y.render()),
            plot: seed.plot,
        });
        self.movies.insert(seed.id.clone(), movie);
        self.order.push(seed.id);

        for name in seed.directors {
            let person = self.named_node(NodeKind::Person, &name, Some(&name));
            self.link(person, movie, Relation::Directed, None);
        }
        for name in seed.actors {
            let person = self.named_node(NodeKind::Person, &name, Some(&name));
            self.link(person, movie, Relation::ActedIn, None);
        }
        for name in seed.genres {
            let genre = self.named_node(NodeKind::Genre, &name, Some(&name));
            self.link(movie, genre, Relation::InGenre, None);
        }
        for name in seed.languages {
            let language = self.named_node(NodeKind::Language, &name, Some(&name));
            self.link(movie, language, Relation::InLanguage, None);
        }
        for name in seed.countries {
            let country = self.named_node(NodeKind::Country, &name, Some(&name));
            self.link(movie, country, Relation::ProducedIn, None);
        }
        for rating in seed.ratings {
            let user = self.named_node(NodeKind::User, &rating.user_id, rating.name.as_deref());
            self.link(user, movie, Relation::Rated, Some(rating.rating));
        }
        Ok(())
    }

    fn named_node(&mut self, kind: NodeKind, key: &str, name: Option<&str>) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .named
            .entry((kind, key.to_string()))
            .or_insert_with(|| {
                graph.add_node(GraphNode::Named {
                    kind,
                    key: key.to_string(),
                    name: name.map(str::to_string),
                })
            })
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex, relation: Relation, rating: Option<f64>) {
        self.graph.add_edge(from, to, EdgeData { relation, rating });
    }

    /// Names on the far side of `relation` edges, in insertion order.
    fn related(&self, movie: NodeIndex, relation: Relation, direction: Direction) -> Vec<String> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(movie, direction)
            .filter(|e| e.weight().relation == relation)
            .collect();
        edges.sort_by_key(|e| e.id().index());

        edges
            .into_iter()
            .filter_map(|e| {
                let other = if direction == Direction::Incoming {
                    e.source()
                } else {
                    e.target()
                };
                self.graph[other].display_name().map(str::to_string)
            })
            .collect()
    }

    fn record(&self, idx: NodeIndex, options: &FetchOptions) -> Option<MovieRecord> {
        let GraphNode::Movie {
            id,
            title,
            year,
            plot,
        } = &self.graph[idx]
        else {
            return None;
        };

        let mut record = MovieRecord::new(id.clone());
        if let Some(title) = title {
            record.title = title.clone();
        }
        if let Some(year) = year {
            record.year = year.clone();
        }
        if options.plot {
            if let Some(plot) = plot {
                record.plot = plot.clone();
            }
        }
        if options.actors {
            record.actors = self.related(idx, Relation::ActedIn, Direction::Incoming);
        }
        if options.directors {
            record.directors = self.related(idx, Relation::Directed, Direction::Incoming);
        }
        if options.genres {
            record.genres = self.related(idx, Relation::InGenre, Direction::Outgoing);
        }
        if options.locales {
            record.languages = self.related(idx, Relation::InLanguage, Direction::Outgoing);
            record.countries = self.related(idx, Relation::ProducedIn, Direction::Outgoing);
        }

        if options.ratings || options.raters {
            let mut rated: Vec<_> = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|e| e.weight().relation == Relation::Rated)
                .collect();
            rated.sort_by_key(|e| e.id().index());

            if options.ratings {
                let scores: Vec<f64> = rated.iter().filter_map(|e| e.weight().rating).collect();
                record.ratings = RatingStats::from_scores(&scores);
            }
            if options.raters {
                record.raters = rated
                    .iter()
                    .filter_map(|e| match &self.graph[e.source()] {
                        GraphNode::Named {
                            kind: NodeKind::User,
                            key,
                            name,
                        } => Some(Rater {
                            id: key.clone(),
                            name: name.clone().unwrap_or_default(),
                        }),
                        _ => None,
                    })
                    .collect();
            }
        }

        Some(record.coalesce())
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_movies(
        &self,
        ids: &[MovieId],
        options: &FetchOptions,
    ) -> GraphResult<Vec<MovieRecord>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.movies.get(id))
            .filter_map(|idx| self.record(*idx, options))
            .collect())
    }

    async fn all_movies(&self, limit: usize) -> GraphResult<Vec<MovieRecord>> {
        let options = FetchOptions::for_indexing();
        Ok(self
            .order
            .iter()
            .take(limit)
            .filter_map(|id| self.movies.get(id))
            .filter_map(|idx| self.record(*idx, &options))
            .collect())
    }
}
