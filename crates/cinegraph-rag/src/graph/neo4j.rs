//! Neo4j graph store over the recommendations schema.
//!
//! Requires the `neo4j` feature.

use super::{FetchOptions, GraphStore};
use crate::error::{GraphError, GraphResult};
use async_trait::async_trait;
use cinegraph_core::{MovieId, MovieRecord, Rater, RatingStats, NO_PLOT, UNKNOWN};
use neo4rs::{query, Graph, Row};
use tracing::{debug, info};

/// Graph store backed by Neo4j.
pub struct Neo4jGraphStore {
    graph: Graph,
    uri: String,
}

impl Neo4jGraphStore {
    /// Connect to a Neo4j server.
    pub async fn connect(uri: &str, user: &str, password: &str) -> GraphResult<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| GraphError::Connection(format!("{uri}: {e}")))?;
        info!(uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            uri: uri.to_string(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn run(&self, q: neo4rs::Query, options: &FetchOptions) -> GraphResult<Vec<MovieRecord>> {
        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?
        {
            records.push(row_to_record(&row, options)?);
        }
        Ok(records)
    }
}

/// Where the movie rows come from.
enum Source {
    Ids,
    Scan,
}

/// Assemble one Cypher statement from the include flags.
///
/// Each relationship kind is collected in its own `WITH` stage so that the
/// rows of one `OPTIONAL MATCH` never multiply the rows of the next.
fn build_cypher(options: &FetchOptions, source: Source) -> String {
    let mut cypher = String::new();
    match source {
        Source::Ids => cypher.push_str("MATCH (m:Movie) WHERE m.movieId IN $ids\n"),
        Source::Scan => cypher.push_str("MATCH (m:Movie)\nWITH m LIMIT $limit\n"),
    }

    let mut carried: Vec<&str> = vec!["m"];
    if options.actors {
        push_stage(
            &mut cypher,
            &carried,
            "(a:Actor)-[:ACTED_IN]->(m)",
            "collect(DISTINCT a.name) AS actors",
        );
        carried.push("actors");
    }
    if options.directors {
        push_stage(
            &mut cypher,
            &carried,
            "(d:Director)-[:DIRECTED]->(m)",
            "collect(DISTINCT d.name) AS directors",
        );
        carried.push("directors");
    }
    if options.genres {
        push_stage(
            &mut cypher,
            &carried,
            "(m)-[:IN_GENRE]->(g:Genre)",
            "collect(DISTINCT g.name) AS genres",
        );
        carried.push("genres");
    }
    if options.ratings || options.raters {
        push_stage(
            &mut cypher,
            &carried,
            "(u:User)-[r:RATED]->(m)",
            "count(r) AS rating_count, avg(r.rating) AS avg_rating, \
             collect([COALESCE(toString(u.userId), ''), COALESCE(u.name, '')]) AS raters",
        );
    }

    cypher.push_str(&format!(
        "RETURN m.movieId AS id, \
         COALESCE(m.title, '{UNKNOWN}') AS title, \
         COALESCE(toString(m.year), '{UNKNOWN}') AS year, \
         COALESCE(m.plot, '{NO_PLOT}') AS plot, \
         COALESCE(m.languages, []) AS languages, \
         COALESCE(m.countries, []) AS countries"
    ));
    for column in ["actors", "directors", "genres"] {
        if carried.contains(&column) {
            cypher.push_str(&format!(", {column}"));
        }
    }
    if options.ratings || options.raters {
        cypher.push_str(", rating_count, avg_rating, raters");
    }
    cypher
}

fn push_stage(cypher: &mut String, carried: &[&str], pattern: &str, collect: &str) {
    cypher.push_str("OPTIONAL MATCH ");
    cypher.push_str(pattern);
    cypher.push('\n');
    cypher.push_str(&format!("WITH {}, {}\n", carried.join(", "), collect));
}

fn column<T: serde::de::DeserializeOwned>(row: &Row, name: &str) -> GraphResult<T> {
    row.get::<T>(name)
        .map_err(|e| GraphError::Query(format!("column {name}: {e}")))
}

fn optional_list(row: &Row, name: &str) -> Vec<String> {
    row.get::<Vec<String>>(name).unwrap_or_default()
}

fn row_to_record(row: &Row, options: &FetchOptions) -> GraphResult<MovieRecord> {
    let id: String = match row.get::<String>("id") {
        Ok(id) => id,
        Err(_) => column::<i64>(row, "id")?.to_string(),
    };

    let mut record = MovieRecord::new(id)
        .with_title(column::<String>(row, "title")?)
        .with_year(column::<String>(row, "year")?);
    if options.plot {
        record.plot = column::<String>(row, "plot")?;
    }
    if options.locales {
        record.languages = optional_list(row, "languages");
        record.countries = optional_list(row, "countries");
    }
    record.actors = optional_list(row, "actors");
    record.directors = optional_list(row, "directors");
    record.genres = optional_list(row, "genres");

    if options.ratings {
        let count = row.get::<i64>("rating_count").unwrap_or(0).max(0) as u64;
        let average = row.get::<Option<f64>>("avg_rating").unwrap_or(None);
        record.ratings = RatingStats::from_aggregate(count, average);
    }
    if options.raters {
        record.raters = row
            .get::<Vec<Vec<String>>>("raters")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|pair| match pair.as_slice() {
                [id, name] if !id.is_empty() => Some(Rater {
                    id: id.clone(),
                    name: name.clone(),
                }),
                _ => None,
            })
            .collect();
    }

    Ok(record.coalesce())
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn fetch_movies(
        &self,
        ids: &[MovieId],
        options: &FetchOptions,
    ) -> GraphResult<Vec<MovieRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = query(&build_cypher(options, Source::Ids)).param("ids", ids.to_vec());
        let records = self.run(q, options).await?;
        debug!(requested = ids.len(), found = records.len(), "Fetched movies from Neo4j");
        Ok(records)
    }

    async fn all_movies(&self, limit: usize) -> GraphResult<Vec<MovieRecord>> {
        let options = FetchOptions::for_indexing();
        let q = query(&build_cypher(&options, Source::Scan)).param("limit", limit as i64);
        self.run(q, &options).await
    }

    async fn health_check(&self) -> GraphResult<bool> {
        match self.graph.execute(query("RETURN 1 AS ok")).await {
            Ok(mut result) => Ok(matches!(result.next().await, Ok(Some(_)))),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_shape() {
        let cypher = build_cypher(&FetchOptions::default(), Source::Ids);

        assert!(cypher.starts_with("MATCH (m:Movie) WHERE m.movieId IN $ids"));
        assert!(cypher.contains("collect(DISTINCT a.name) AS actors"));
        assert!(cypher.contains("WITH m, actors, directors, genres, count(r) AS rating_count"));
        assert!(cypher.contains("COALESCE(m.plot, 'No plot available') AS plot"));
        assert!(cypher.contains("COALESCE(m.title, 'Unknown') AS title"));
        assert!(cypher.ends_with(", actors, directors, genres, rating_count, avg_rating, raters"));
    }

    #[test]
    fn test_flags_drop_stages() {
        let options = FetchOptions {
            actors: false,
            ratings: false,
            ..FetchOptions::default()
        };
        let cypher = build_cypher(&options, Source::Ids);

        assert!(!cypher.contains("ACTED_IN"));
        assert!(!cypher.contains("RATED"));
        assert!(cypher.contains("WITH m, directors, collect(DISTINCT g.name) AS genres"));
        assert!(cypher.ends_with(", directors, genres"));
    }

    #[test]
    fn test_scan_query_uses_limit() {
        let cypher = build_cypher(&FetchOptions::for_indexing(), Source::Scan);
        assert!(cypher.contains("WITH m LIMIT $limit"));
        assert!(!cypher.contains("$ids"));
    }
}
