//! Core types shared across the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder for any scalar attribute the graph store has no value for.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for a missing description.
pub const NO_PLOT: &str = "No plot available";

/// Opaque entity key as stored in the graph (`Movie.movieId`).
pub type MovieId = String;

/// Relationship kinds rendered into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    ActedIn,
    Directed,
    InGenre,
    InLanguage,
    ProducedIn,
    Rated,
}

impl Relation {
    /// Graph relationship type label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::ActedIn => "ACTED_IN",
            Relation::Directed => "DIRECTED",
            Relation::InGenre => "IN_GENRE",
            Relation::InLanguage => "IN_LANGUAGE",
            Relation::ProducedIn => "PRODUCED_IN",
            Relation::Rated => "RATED",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable rendering of one edge, built for prompts and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPath {
    pub source: String,
    pub relation: Relation,
    pub target: String,
}

impl RelationshipPath {
    pub fn new(source: impl Into<String>, relation: Relation, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            relation,
            target: target.into(),
        }
    }
}

impl fmt::Display for RelationshipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} —[{}]→ {}", self.source, self.relation, self.target)
    }
}

/// A user who rated an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rater {
    pub id: String,
    pub name: String,
}

/// Aggregated rating statistics, computed at fetch time.
///
/// An entity with no rating edges reports `count == 0` and `average == 0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingStats {
    pub count: u64,
    pub average: f64,
}

impl RatingStats {
    /// Aggregate raw scores.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let sum: f64 = scores.iter().sum();
        Self {
            count: scores.len() as u64,
            average: sum / scores.len() as f64,
        }
    }

    /// Build from store-side aggregates where the average may be null.
    pub fn from_aggregate(count: u64, average: Option<f64>) -> Self {
        let average = match average {
            Some(avg) if count > 0 && avg.is_finite() => avg,
            _ => 0.0,
        };
        Self { count, average }
    }
}

/// One entity with its attributes, relationship name lists and ratings.
///
/// Scalars are never empty: absent values carry [`UNKNOWN`] or [`NO_PLOT`].
/// Relationship lists are empty rather than absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub year: String,
    pub plot: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub raters: Vec<Rater>,
    #[serde(default)]
    pub ratings: RatingStats,
    #[serde(default)]
    pub paths: Vec<RelationshipPath>,
}

impl MovieRecord {
    /// Create a record with placeholder attributes.
    pub fn new(id: impl Into<MovieId>) -> Self {
        Self {
            id: id.into(),
            title: UNKNOWN.to_string(),
            year: UNKNOWN.to_string(),
            plot: NO_PLOT.to_string(),
            actors: Vec::new(),
            directors: Vec::new(),
            genres: Vec::new(),
            languages: Vec::new(),
            countries: Vec::new(),
            raters: Vec::new(),
            ratings: RatingStats::default(),
            paths: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_year(mut self, year: impl ToString) -> Self {
        self.year = year.to_string();
        self
    }

    pub fn with_plot(mut self, plot: impl Into<String>) -> Self {
        self.plot = plot.into();
        self
    }

    pub fn with_actors(mut self, actors: Vec<String>) -> Self {
        self.actors = actors;
        self
    }

    pub fn with_directors(mut self, directors: Vec<String>) -> Self {
        self.directors = directors;
        self
    }

    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_ratings(mut self, ratings: RatingStats) -> Self {
        self.ratings = ratings;
        self
    }

    /// Replace blank scalars with placeholders and drop blank names from lists.
    pub fn coalesce(mut self) -> Self {
        fill_blank(&mut self.title, UNKNOWN);
        fill_blank(&mut self.year, UNKNOWN);
        fill_blank(&mut self.plot, NO_PLOT);
        for list in [
            &mut self.actors,
            &mut self.directors,
            &mut self.genres,
            &mut self.languages,
            &mut self.countries,
        ] {
            list.retain(|name| !name.trim().is_empty());
        }
        for rater in &mut self.raters {
            fill_blank(&mut rater.name, UNKNOWN);
        }
        if !self.ratings.average.is_finite() || self.ratings.count == 0 {
            self.ratings.average = 0.0;
        }
        self
    }

    /// Build relationship paths from the name lists.
    pub fn derive_paths(&self) -> Vec<RelationshipPath> {
        let mut paths = Vec::new();
        for name in &self.directors {
            paths.push(RelationshipPath::new(name, Relation::Directed, &self.title));
        }
        for name in &self.actors {
            paths.push(RelationshipPath::new(name, Relation::ActedIn, &self.title));
        }
        for genre in &self.genres {
            paths.push(RelationshipPath::new(&self.title, Relation::InGenre, genre));
        }
        for language in &self.languages {
            paths.push(RelationshipPath::new(&self.title, Relation::InLanguage, language));
        }
        for country in &self.countries {
            paths.push(RelationshipPath::new(&self.title, Relation::ProducedIn, country));
        }
        for rater in &self.raters {
            paths.push(RelationshipPath::new(&rater.name, Relation::Rated, &self.title));
        }
        paths
    }

    /// Text block embedded for this entity at index-build time.
    pub fn descriptive_text(&self) -> String {
        format!(
            "Title: {}\nYear: {}\nPlot: {}\nActors: {}\nDirectors: {}\nGenres: {}",
            self.title,
            self.year,
            self.plot,
            self.actors.join(", "),
            self.directors.join(", "),
            self.genres.join(", "),
        )
    }

    /// Attributes persisted beside the vector in the index entry list.
    pub fn index_attributes(&self) -> BTreeMap<String, serde_json::Value> {
        let mut attrs = BTreeMap::new();
        attrs.insert("title".to_string(), self.title.clone().into());
        attrs.insert("year".to_string(), self.year.clone().into());
        attrs.insert("directors".to_string(), self.directors.clone().into());
        attrs.insert("genres".to_string(), self.genres.clone().into());
        attrs
    }
}

fn fill_blank(value: &mut String, placeholder: &str) {
    if value.trim().is_empty() {
        *value = placeholder.to_string();
    }
}

/// Per-query aggregation of entities. Created fresh for every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    pub query: String,
    pub movies: Vec<MovieRecord>,
}

impl ContextBundle {
    pub fn new(query: impl Into<String>, movies: Vec<MovieRecord>) -> Self {
        Self {
            query: query.into(),
            movies,
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.title.as_str()).collect()
    }

    /// Order by descending average rating. Ties keep their current order.
    pub fn sort_by_rating(&mut self) {
        self.movies.sort_by(|a, b| {
            b.ratings
                .average
                .partial_cmp(&a.ratings.average)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
