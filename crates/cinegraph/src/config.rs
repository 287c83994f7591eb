//! Configuration management.
//!
//! Settings live in `cinegraph.toml`, found in the current or a parent
//! directory. Every field has a default, so a partial file (or none at all)
//! still yields a working configuration. Secrets come from the environment
//! and override the file.

use anyhow::{Context, Result};
use cinegraph_rag::{FetchOptions, ListLimits, Persona, PromptPolicy, RetrievalConfig};
use cinegraph_vectors::{DistanceMetric, IndexPaths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "cinegraph.toml";

/// Cinegraph configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackend {
    #[default]
    Neo4j,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub backend: GraphBackend,
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    /// Prefer `NEO4J_PASSWORD` over writing this to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Seed file for the `memory` backend.
    #[serde(default = "default_seed")]
    pub seed: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// Feature hashing, no model download.
    #[default]
    Hash,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_entries_file")]
    pub entries_file: String,
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Maximum entities scanned per rebuild.
    #[serde(default = "default_rebuild_limit")]
    pub rebuild_limit: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSection {
    #[serde(default = "default_k")]
    pub k: usize,
    /// Inner product: minimum similarity. L2: maximum distance.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
    #[serde(default = "default_true")]
    pub sort_by_rating: bool,
    #[serde(default)]
    pub include: FetchOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    /// Canned answers, for demos without a model.
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Defaults to the provider preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_context_size")]
    pub context_size: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSection {
    #[serde(default)]
    pub persona: Persona,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_data_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_rules: Vec<String>,
    #[serde(default)]
    pub limits: ListLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_neo4j_uri() -> String { "bolt://localhost:7687".to_string() }
fn default_neo4j_user() -> String { "neo4j".to_string() }
fn default_seed() -> PathBuf { PathBuf::from("data/movies.json") }
fn default_dimension() -> usize { 384 }
fn default_index_dir() -> PathBuf { PathBuf::from("data") }
fn default_index_file() -> String { "movie_index.bin".to_string() }
fn default_entries_file() -> String { "movies_list.json".to_string() }
fn default_rebuild_limit() -> usize { 50_000 }
fn default_batch_size() -> usize { 64 }
fn default_k() -> usize { 10 }
fn default_min_similarity() -> f32 { 0.3 }
fn default_true() -> bool { true }
fn default_max_tokens() -> u32 { 1024 }
fn default_context_size() -> u32 { 4096 }
fn default_timeout() -> u32 { 60 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::default(),
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password: None,
            seed: default_seed(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: None,
            endpoint: None,
            dimension: default_dimension(),
            api_key: None,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            index_file: default_index_file(),
            entries_file: default_entries_file(),
            metric: DistanceMetric::default(),
            rebuild_limit: default_rebuild_limit(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            k: default_k(),
            min_similarity: default_min_similarity(),
            sort_by_rating: true,
            include: FetchOptions::default(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            temperature: None,
            max_tokens: default_max_tokens(),
            context_size: default_context_size(),
            timeout_secs: default_timeout(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl Default for PromptSection {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            system: None,
            no_data_message: None,
            failure_message: None,
            extra_rules: Vec::new(),
            limits: ListLimits::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl IndexConfig {
    pub fn paths(&self) -> IndexPaths {
        IndexPaths::in_dir(&self.dir, &self.index_file, &self.entries_file)
    }
}

impl RetrievalSection {
    pub fn to_retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig::default()
            .with_k(self.k)
            .with_min_similarity(Some(self.min_similarity))
            .with_sort_by_rating(self.sort_by_rating)
    }
}

impl PromptSection {
    /// The persona preset with this section's overrides applied.
    pub fn to_policy(&self) -> PromptPolicy {
        let mut policy = PromptPolicy::for_persona(self.persona).with_limits(self.limits);
        if let Some(system) = &self.system {
            policy = policy.with_system(system.clone());
        }
        if let Some(message) = &self.no_data_message {
            policy = policy.with_no_data_message(message.clone());
        }
        if let Some(message) = &self.failure_message {
            policy = policy.with_failure_message(message.clone());
        }
        for rule in &self.extra_rules {
            policy = policy.with_rule(rule.clone());
        }
        policy
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load `cinegraph.toml` from the current or parent directories, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => Self::read(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load a specific file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse `path`. Relative data paths are taken from the file's directory.
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Anchor relative seed and index paths at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.graph.seed, &mut self.index.dir] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Generate default config as TOML string.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize config")
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Apply overrides from a variable lookup.
    ///
    /// `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` configure the graph store,
    /// `OPENAI_API_KEY` both OpenAI clients, `OLLAMA_API_URL` both Ollama
    /// endpoints.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.graph.password = Some(password);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key.clone());
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = lookup("OLLAMA_API_URL") {
            if self.llm.provider == LlmProvider::Ollama {
                self.llm.endpoint = Some(url.clone());
            }
            if self.embedding.provider == EmbeddingProvider::Ollama {
                self.embedding.endpoint = Some(url);
            }
        }
    }
}

/// Find `cinegraph.toml` in current or parent directories.
pub fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.index.rebuild_limit, 50_000);
        assert_eq!(config.retrieval.k, 10);
        assert!(config.retrieval.sort_by_rating);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [graph]
            backend = "memory"
            seed = "fixtures/movies.json"

            [retrieval]
            k = 20
            min_similarity = 0.5

            [retrieval.include]
            raters = true

            [llm]
            provider = "ollama"
            temperature = 0.3

            [index]
            metric = "l2"

            [prompt]
            persona = "customer_support"
            "#,
        )
        .unwrap();

        assert_eq!(config.graph.backend, GraphBackend::Memory);
        assert_eq!(config.graph.uri, "bolt://localhost:7687");
        assert_eq!(config.retrieval.k, 20);
        assert!(config.retrieval.include.raters);
        assert!(config.retrieval.include.actors);
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.temperature, Some(0.3));
        assert_eq!(config.index.metric, DistanceMetric::L2);
        assert_eq!(config.prompt.to_policy().persona, Persona::CustomerSupport);

        let retrieval = config.retrieval.to_retrieval_config();
        assert_eq!(retrieval.min_similarity, Some(0.5));
    }

    #[test]
    fn test_default_toml_round_trips() {
        let text = Config::default_toml().unwrap();
        assert!(text.contains("[server]"));
        assert!(!text.contains("api_key"));
        assert_eq!(Config::from_toml(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NEO4J_URI", "bolt://db:7687"),
            ("NEO4J_PASSWORD", "secret"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OLLAMA_API_URL", "http://gpu:11434"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.llm.provider = LlmProvider::Ollama;
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.graph.uri, "bolt://db:7687");
        assert_eq!(config.graph.password.as_deref(), Some("secret"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.endpoint.as_deref(), Some("http://gpu:11434"));
        // embedding provider is still `hash`
        assert_eq!(config.embedding.endpoint, None);
    }

    #[test]
    fn test_prompt_overrides() {
        let section = PromptSection {
            no_data_message: Some("Nothing here.".to_string()),
            extra_rules: vec!["Answer in French.".to_string()],
            ..PromptSection::default()
        };
        let policy = section.to_policy();
        assert_eq!(policy.no_data_message, "Nothing here.");
        assert!(policy.rules.iter().any(|r| r == "Answer in French."));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.server.port = 9000;
        config.save(&path).unwrap();

        let reloaded = Config::read(&path).unwrap();
        assert_eq!(reloaded.server.port, 9000);
    }

    #[test]
    fn test_data_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project");
        std::fs::create_dir_all(&nested).unwrap();
        let path = nested.join(CONFIG_FILE);
        std::fs::write(
            &path,
            "[graph]\nseed = \"fixtures/movies.json\"\n\n[index]\ndir = \"/var/lib/cinegraph\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.graph.seed, nested.join("fixtures/movies.json"));
        assert_eq!(config.index.dir, PathBuf::from("/var/lib/cinegraph"));
        assert_eq!(
            config.index.paths().index,
            PathBuf::from("/var/lib/cinegraph/movie_index.bin")
        );

        std::fs::write(&path, "").unwrap();
        let defaults = Config::load_from(&path).unwrap();
        assert_eq!(defaults.graph.seed, nested.join("data/movies.json"));
        assert_eq!(defaults.index.dir, nested.join("data"));
    }
}
