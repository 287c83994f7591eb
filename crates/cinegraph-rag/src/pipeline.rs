//! The question-answering pipeline.
//!
//! Data flows one way: query → vector → candidate ids → context bundle →
//! prompt → answer text. An empty context bundle stops the flow before the
//! LLM is called.

use crate::context::ContextFetcher;
use crate::directive::{prepend_directives, strip_directives, Directive, DirectiveRules};
use crate::error::{RagError, RagResult};
use crate::graph::{FetchOptions, GraphStore};
use crate::prompt::{PromptComposer, PromptPolicy};
use crate::retriever::{RetrievalConfig, Retriever, ScoredId};
use cinegraph_core::ContextBundle;
use cinegraph_embeddings::{normalize_l2, Embedder};
use cinegraph_llm::LlmBackend;
use cinegraph_vectors::PersistedIndex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// How an answer came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The LLM produced the text.
    Answered,
    /// Retrieval found nothing; the no-data message was returned.
    NoData,
    /// The query was blank.
    EmptyQuery,
    /// A collaborator failed; the apology message was returned.
    Failed,
}

/// A generated answer with its context.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    /// Answer text with directive tokens in front.
    pub text: String,
    pub directives: Vec<Directive>,
    pub context: ContextBundle,
    pub outcome: AnswerOutcome,
}

impl Answer {
    fn fixed(question: &str, text: &str, outcome: AnswerOutcome) -> Self {
        Self {
            question: question.to_string(),
            text: text.to_string(),
            directives: Vec::new(),
            context: ContextBundle::empty(question),
            outcome,
        }
    }

    /// The text without directive tokens.
    pub fn display_text(&self) -> String {
        strip_directives(&self.text).1
    }
}

/// Graph-augmented retrieval and answering.
pub struct GraphRag {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    fetcher: ContextFetcher,
    composer: PromptComposer,
    directives: DirectiveRules,
    llm: Arc<dyn LlmBackend>,
}

impl GraphRag {
    pub fn builder() -> GraphRagBuilder {
        GraphRagBuilder::default()
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        self.fetcher.store()
    }

    pub fn llm(&self) -> &Arc<dyn LlmBackend> {
        &self.llm
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn policy(&self) -> &PromptPolicy {
        self.composer.policy()
    }

    /// Embed a query on the blocking pool.
    pub async fn embed_query(&self, query: &str) -> RagResult<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let mut vector = tokio::task::spawn_blocking(move || embedder.embed(&text)).await??;
        self.embedder.check_dimension(&vector)?;

        if self.retriever.metric().requires_normalization() {
            normalize_l2(&mut vector);
        }
        Ok(vector)
    }

    /// Nearest identifiers for `query`, at most `k`.
    pub async fn search(&self, query: &str, k: usize) -> RagResult<Vec<ScoredId>> {
        let vector = self.embed_query(query).await?;
        self.retriever.search_k(&vector, k)
    }

    /// The context bundle for `query`.
    pub async fn retrieve(&self, query: &str) -> RagResult<ContextBundle> {
        if query.trim().is_empty() {
            return Ok(ContextBundle::empty(query));
        }
        let vector = self.embed_query(query).await?;
        let hits = self.retriever.search(&vector)?;
        Ok(self.fetcher.fetch(query, &hits).await?)
    }

    /// Answer `query`, surfacing collaborator errors.
    pub async fn try_answer(&self, query: &str) -> RagResult<Answer> {
        let policy = self.composer.policy();
        if query.trim().is_empty() {
            return Ok(Answer::fixed(
                query,
                &policy.empty_query_message,
                AnswerOutcome::EmptyQuery,
            ));
        }

        let context = self.retrieve(query).await?;
        if context.is_empty() {
            debug!(query, "No context found; skipping LLM call");
            return Ok(Answer::fixed(
                query,
                &policy.no_data_message,
                AnswerOutcome::NoData,
            ));
        }

        let prompt = self.composer.compose(&context);
        let generated = self
            .llm
            .complete(Some(&prompt.system), &prompt.user)
            .await?;

        let mut directives = self.directives.detect(query);
        let (echoed, body) = strip_directives(&generated);
        for directive in echoed {
            if !directives.contains(&directive) {
                directives.push(directive);
            }
        }

        debug!(
            movies = context.len(),
            directives = directives.len(),
            backend = self.llm.name(),
            "Answered query"
        );

        Ok(Answer {
            question: query.to_string(),
            text: prepend_directives(&directives, &body),
            directives,
            context,
            outcome: AnswerOutcome::Answered,
        })
    }

    /// Answer `query`. Failures become the policy's apology message.
    pub async fn answer(&self, query: &str) -> Answer {
        match self.try_answer(query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, query, "Answer failed");
                Answer::fixed(
                    query,
                    &self.composer.policy().failure_message,
                    AnswerOutcome::Failed,
                )
            }
        }
    }
}

/// Assembles a [`GraphRag`].
#[derive(Default)]
pub struct GraphRagBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<PersistedIndex>>,
    store: Option<Arc<dyn GraphStore>>,
    llm: Option<Arc<dyn LlmBackend>>,
    retrieval: RetrievalConfig,
    fetch: FetchOptions,
    policy: PromptPolicy,
    directives: DirectiveRules,
}

impl GraphRagBuilder {
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn index(mut self, index: Arc<PersistedIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn store(mut self, store: Arc<dyn GraphStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn retrieval(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = config;
        self
    }

    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch = options;
        self
    }

    pub fn policy(mut self, policy: PromptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn directives(mut self, rules: DirectiveRules) -> Self {
        self.directives = rules;
        self
    }

    pub fn build(self) -> RagResult<GraphRag> {
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("an embedder is required".to_string()))?;
        let index = self
            .index
            .ok_or_else(|| RagError::Config("a vector index is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::Config("a graph store is required".to_string()))?;
        let llm = self
            .llm
            .ok_or_else(|| RagError::Config("an LLM backend is required".to_string()))?;

        if index.index().dimension() != embedder.dimension() {
            return Err(RagError::Config(format!(
                "index dimension {} does not match embedder dimension {}",
                index.index().dimension(),
                embedder.dimension()
            )));
        }

        let fetcher = ContextFetcher::new(store)
            .with_options(self.fetch)
            .with_sort_by_rating(self.retrieval.sort_by_rating);

        Ok(GraphRag {
            embedder,
            retriever: Retriever::new(index, self.retrieval),
            fetcher,
            composer: PromptComposer::new(self.policy),
            directives: self.directives,
            llm,
        })
    }
}
