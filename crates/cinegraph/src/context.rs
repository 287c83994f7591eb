//! Application wiring.
//!
//! [`AppContext`] turns a [`Config`] into a ready [`GraphRag`]: it connects
//! the graph store, loads or rebuilds the vector index, and picks the
//! embedding and LLM backends.

use crate::config::{Config, EmbeddingProvider, GraphBackend, LlmProvider};
use anyhow::{Context, Result};
use cinegraph_embeddings::{Embedder, HashEmbedder};
use cinegraph_llm::{LlmBackend, LlmConfig, MockBackend};
use cinegraph_rag::{GraphRag, GraphStore, IndexBuilder, MemoryGraphStore};
use cinegraph_rag::index::ProgressFn;
use cinegraph_vectors::{IndexPaths, PersistedIndex};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const OLLAMA_URL: &str = "http://localhost:11434";

/// Reachability of the external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub graph: bool,
    pub llm: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.graph && self.llm
    }
}

/// A configured pipeline plus the configuration it came from.
pub struct AppContext {
    config: Config,
    rag: GraphRag,
}

impl AppContext {
    /// Connect everything described by `config`.
    ///
    /// A missing or stale index is rebuilt from the graph store before the
    /// context is returned.
    pub async fn open(config: Config) -> Result<Self> {
        let store = connect_store(&config).await?;
        let embedder = build_embedder(&config).await?;
        let llm = match build_llm(&config) {
            Ok(llm) => llm,
            Err(e) => {
                release(embedder).await;
                return Err(e);
            }
        };
        Self::from_parts(config, store, embedder, llm).await
    }

    /// Assemble from already-built collaborators.
    pub async fn from_parts(
        config: Config,
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmBackend>,
    ) -> Result<Self> {
        let assembled = assemble(&config, store, Arc::clone(&embedder), llm).await;
        match assembled {
            Ok(rag) => Ok(Self { config, rag }),
            Err(e) => {
                release(embedder).await;
                Err(e)
            }
        }
    }

    pub fn rag(&self) -> &GraphRag {
        &self.rag
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index_paths(&self) -> IndexPaths {
        self.config.index.paths()
    }

    pub async fn health(&self) -> HealthReport {
        let graph = self.rag.store().health_check().await.unwrap_or_else(|e| {
            warn!(error = %e, "Graph store health check failed");
            false
        });
        let llm = self.rag.llm().health_check().await.unwrap_or_else(|e| {
            warn!(error = %e, "LLM health check failed");
            false
        });
        HealthReport { graph, llm }
    }

    /// Shut down, releasing blocking HTTP clients off the async runtime.
    pub async fn close(self) {
        let embedder = Arc::clone(self.rag.embedder());
        drop(self.rag);
        release(embedder).await;
        info!("Context closed");
    }
}

async fn assemble(
    config: &Config,
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmBackend>,
) -> Result<GraphRag> {
    let builder = index_builder(config, Arc::clone(&store), Arc::clone(&embedder));
    let index = builder
        .ensure(&config.index.paths())
        .await
        .context("Failed to load or build the vector index")?;

    let rag = GraphRag::builder()
        .embedder(embedder)
        .index(Arc::new(index))
        .store(store)
        .llm(llm)
        .retrieval(config.retrieval.to_retrieval_config())
        .fetch_options(config.retrieval.include)
        .policy(config.prompt.to_policy())
        .build()?;
    Ok(rag)
}

fn index_builder(
    config: &Config,
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
) -> IndexBuilder {
    IndexBuilder::new(store, embedder)
        .with_metric(config.index.metric)
        .with_limit(config.index.rebuild_limit)
        .with_batch_size(config.index.batch_size)
}

/// Rebuild the index files from the graph store.
pub async fn build_index(
    config: &Config,
    limit: Option<usize>,
    progress: Option<ProgressFn>,
) -> Result<PersistedIndex> {
    let store = connect_store(config).await?;
    let embedder = build_embedder(config).await?;

    let mut builder = index_builder(config, store, Arc::clone(&embedder));
    if let Some(limit) = limit {
        builder = builder.with_limit(limit);
    }
    if let Some(progress) = progress {
        builder = builder.with_progress(progress);
    }

    let built = builder.rebuild(&config.index.paths()).await;
    drop(builder);
    release(embedder).await;
    Ok(built?)
}

/// Connect the configured graph store.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn GraphStore>> {
    match config.graph.backend {
        GraphBackend::Memory => {
            let store = MemoryGraphStore::from_seed_file(&config.graph.seed).with_context(|| {
                format!("Failed to load seed file: {}", config.graph.seed.display())
            })?;
            Ok(Arc::new(store))
        }
        GraphBackend::Neo4j => connect_neo4j(config).await,
    }
}

#[cfg(feature = "neo4j")]
async fn connect_neo4j(config: &Config) -> Result<Arc<dyn GraphStore>> {
    let graph = &config.graph;
    let password = graph.password.as_deref().unwrap_or_default();
    let store = cinegraph_rag::graph::Neo4jGraphStore::connect(&graph.uri, &graph.user, password)
        .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "neo4j"))]
async fn connect_neo4j(_config: &Config) -> Result<Arc<dyn GraphStore>> {
    anyhow::bail!("the neo4j graph backend requires the `neo4j` feature")
}

/// Build the configured embedder.
///
/// HTTP embedders own a blocking client, so they are created on the
/// blocking pool.
pub async fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let settings = config.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || -> Result<Arc<dyn Embedder>> {
        match settings.provider {
            EmbeddingProvider::Hash => Ok(Arc::new(HashEmbedder::new(settings.dimension))),
            EmbeddingProvider::OpenAi | EmbeddingProvider::Ollama => api_embedder(&settings),
        }
    })
    .await??;
    info!(model = embedder.model_name(), dimension = embedder.dimension(), "Embedder ready");
    Ok(embedder)
}

#[cfg(any(feature = "api", feature = "local"))]
fn api_embedder(settings: &crate::config::EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    use cinegraph_embeddings::{ApiConfig, ApiEmbedder};

    let mut api = match settings.provider {
        EmbeddingProvider::OpenAi => {
            let key = settings
                .api_key
                .as_deref()
                .context("OPENAI_API_KEY is required for OpenAI embeddings")?;
            ApiConfig::openai(key)
        }
        _ => ApiConfig::ollama(settings.endpoint.as_deref().unwrap_or(OLLAMA_URL)),
    };
    if let Some(model) = &settings.model {
        // the preset dimension only fits the preset model
        api = api.with_model(model).with_dimension(settings.dimension);
    }
    if let (EmbeddingProvider::OpenAi, Some(endpoint)) = (settings.provider, &settings.endpoint) {
        api = api.with_endpoint(endpoint);
    }
    Ok(Arc::new(ApiEmbedder::new(api)?))
}

#[cfg(not(any(feature = "api", feature = "local")))]
fn api_embedder(_settings: &crate::config::EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    anyhow::bail!("HTTP embedders require the `api` or `local` feature")
}

/// Build the configured LLM backend.
pub fn build_llm(config: &Config) -> Result<Arc<dyn LlmBackend>> {
    let section = &config.llm;
    let preset = match section.provider {
        LlmProvider::OpenAi => LlmConfig::openai(),
        LlmProvider::Ollama => LlmConfig::ollama(),
        LlmProvider::Mock => return Ok(Arc::new(MockBackend::new())),
    };

    let mut llm_config = preset
        .with_max_tokens(section.max_tokens)
        .with_context_size(section.context_size)
        .with_timeout(section.timeout_secs);
    if let Some(model) = &section.model {
        llm_config = llm_config.with_model(model.clone());
    }
    if let Some(temperature) = section.temperature {
        llm_config = llm_config.with_temperature(temperature);
    }

    match section.provider {
        LlmProvider::OpenAi => openai_backend(config, llm_config),
        _ => ollama_backend(config, llm_config),
    }
}

#[cfg(feature = "api")]
fn openai_backend(config: &Config, llm_config: LlmConfig) -> Result<Arc<dyn LlmBackend>> {
    let key = config
        .llm
        .api_key
        .as_deref()
        .context("OPENAI_API_KEY is required for the OpenAI backend")?;
    let mut backend = cinegraph_llm::OpenAiBackend::with_config(key, llm_config)?;
    if let Some(endpoint) = &config.llm.endpoint {
        backend = backend.with_endpoint(endpoint);
    }
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "api"))]
fn openai_backend(_config: &Config, _llm_config: LlmConfig) -> Result<Arc<dyn LlmBackend>> {
    anyhow::bail!("the OpenAI backend requires the `api` feature")
}

#[cfg(feature = "local")]
fn ollama_backend(config: &Config, llm_config: LlmConfig) -> Result<Arc<dyn LlmBackend>> {
    let endpoint = config.llm.endpoint.as_deref().unwrap_or(OLLAMA_URL);
    let backend = cinegraph_llm::OllamaBackend::with_config(endpoint, llm_config)?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "local"))]
fn ollama_backend(_config: &Config, _llm_config: LlmConfig) -> Result<Arc<dyn LlmBackend>> {
    anyhow::bail!("the Ollama backend requires the `local` feature")
}

/// Drop an embedder on the blocking pool.
async fn release(embedder: Arc<dyn Embedder>) {
    if let Err(e) = tokio::task::spawn_blocking(move || drop(embedder)).await {
        warn!(error = %e, "Failed to release embedder");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegraph_rag::{AnswerOutcome, MovieSeed};
    use std::path::Path;

    fn seed_file(dir: &Path) -> std::path::PathBuf {
        let seeds = vec![
            MovieSeed::new("1")
                .with_title("Heat")
                .with_year(1995)
                .with_directors(&["Michael Mann"])
                .with_rating("u1", "Ann", 4.5),
            MovieSeed::new("2")
                .with_title("Ronin")
                .with_year(1998)
                .with_directors(&["John Frankenheimer"]),
        ];
        let path = dir.join("movies.json");
        std::fs::write(&path, serde_json::to_string(&seeds).unwrap()).unwrap();
        path
    }

    fn memory_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.graph.backend = GraphBackend::Memory;
        config.graph.seed = seed_file(dir);
        config.index.dir = dir.join("index");
        config.embedding.dimension = 64;
        config.llm.provider = LlmProvider::Mock;
        config.retrieval.min_similarity = -1.0;
        config
    }

    #[tokio::test]
    async fn test_open_builds_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = memory_config(dir.path());

        let ctx = AppContext::open(config).await.unwrap();
        assert!(ctx.index_paths().exists());
        assert_eq!(ctx.rag().retriever().index().len(), 2);

        let answer = ctx.rag().answer("Who directed Heat?").await;
        assert_eq!(answer.outcome, AnswerOutcome::Answered);
        assert_eq!(answer.text, "Mock response");

        let health = ctx.health().await;
        assert!(health.is_healthy());
        ctx.close().await;
    }

    #[tokio::test]
    async fn test_build_index_honours_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = memory_config(dir.path());

        let index = build_index(&config, Some(1), None).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(PersistedIndex::load(&config.index.paths()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config(dir.path());
        config.graph.seed = dir.path().join("absent.json");

        let err = AppContext::open(config).await.err().unwrap();
        assert!(err.to_string().contains("seed file"));
    }

    #[test]
    fn test_mock_llm_needs_no_credentials() {
        let mut config = Config::default();
        config.llm.provider = LlmProvider::Mock;
        assert_eq!(build_llm(&config).unwrap().name(), "mock");
    }
}
