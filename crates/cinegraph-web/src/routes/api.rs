//! REST API endpoints.

use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use cinegraph::core::MovieRecord;
use cinegraph::HealthReport;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Liveness message.
pub async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "GraphRAG API is running!".to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    /// Directive tokens, if any, lead the text.
    pub answer: String,
}

/// Answer a question. Collaborator failures come back as an apology with 200.
pub async fn ask(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> Json<AskResponse> {
    let answer = state.ctx().rag().answer(&params.query).await;
    info!(
        outcome = ?answer.outcome,
        movies = answer.context.len(),
        "Answered /ask"
    );
    Json(AskResponse {
        question: answer.question,
        answer: answer.text,
    })
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieRecord>,
}

/// The graph context for a query, without an LLM call.
pub async fn movies(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> Result<Json<MoviesResponse>, (StatusCode, Json<StatusMessage>)> {
    let rag = state.ctx().rag();
    match rag.retrieve(&params.query).await {
        Ok(bundle) => Ok(Json(MoviesResponse {
            movies: bundle.movies,
        })),
        Err(e) => {
            warn!(error = %e, "Retrieval failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(StatusMessage {
                    message: rag.policy().failure_message.clone(),
                }),
            ))
        }
    }
}

/// Collaborator reachability; 503 when either is down.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.ctx().health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use cinegraph::prelude::*;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn seeds() -> MemoryGraphStore {
        MemoryGraphStore::from_seeds([
            MovieSeed::new("1")
                .with_title("Heat")
                .with_year(1995)
                .with_directors(&["Michael Mann"])
                .with_rating("u1", "Ann", 4.5),
            MovieSeed::new("2")
                .with_title("Ronin")
                .with_year(1998)
                .with_rating("u1", "Ann", 3.5),
        ])
        .unwrap()
    }

    /// Indexes fine, then refuses every context fetch.
    struct UnreachableStore(MemoryGraphStore);

    #[async_trait]
    impl GraphStore for UnreachableStore {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn fetch_movies(
            &self,
            _ids: &[MovieId],
            _options: &FetchOptions,
        ) -> GraphResult<Vec<MovieRecord>> {
            Err(GraphError::Connection("connection refused".into()))
        }

        async fn all_movies(&self, limit: usize) -> GraphResult<Vec<MovieRecord>> {
            self.0.all_movies(limit).await
        }

        async fn health_check(&self) -> GraphResult<bool> {
            Ok(false)
        }
    }

    async fn state(dir: &std::path::Path, llm: MockBackend) -> AppState {
        state_with(dir, Arc::new(seeds()), llm).await
    }

    async fn state_with(
        dir: &std::path::Path,
        store: Arc<dyn GraphStore>,
        llm: MockBackend,
    ) -> AppState {
        let mut config = Config::default();
        config.index.dir = dir.to_path_buf();
        config.retrieval.min_similarity = -1.0;

        let ctx = AppContext::from_parts(
            config,
            store,
            Arc::new(HashEmbedder::new(64)),
            Arc::new(llm),
        )
        .await
        .unwrap();
        AppState::new(ctx)
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_root_message() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), MockBackend::new()).await;

        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "GraphRAG API is running!");
    }

    #[tokio::test]
    async fn test_ask_returns_question_and_answer() {
        let dir = tempfile::tempdir().unwrap();
        let llm = MockBackend::new().with_default_response("Heat is rated higher.");
        let state = state(dir.path(), llm).await;

        let (status, body) = get(&state, "/ask?query=Compare%20Heat%20and%20Ronin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "Compare Heat and Ronin");
        assert_eq!(body["answer"], "<SHOW_BAR_CHART>\nHeat is rated higher.");
    }

    #[tokio::test]
    async fn test_ask_apologizes_when_llm_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), MockBackend::new().failing()).await;

        let (status, body) = get(&state, "/ask?query=Who%20directed%20Heat").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["answer"],
            "Failed to reach the assistant. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_ask_requires_query() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), MockBackend::new()).await;

        let (status, _) = get(&state, "/ask").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_movies_sorted_by_rating() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), MockBackend::new()).await;

        let (status, body) = get(&state, "/movies?query=Ronin%20or%20Heat").await;
        assert_eq!(status, StatusCode::OK);
        let movies = body["movies"].as_array().unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0]["title"], "Heat");
        assert_eq!(movies[1]["ratings"]["count"], 1);
    }

    #[tokio::test]
    async fn test_movies_reports_unreachable_graph() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(UnreachableStore(seeds()));
        let state = state_with(dir.path(), store, MockBackend::new()).await;

        let (status, body) = get(&state, "/movies?query=Heat").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body["message"],
            "Failed to reach the assistant. Please try again later."
        );

        let (status, body) = get(&state, "/ask?query=Who%20directed%20Heat").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["answer"],
            "Failed to reach the assistant. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_health_reports_llm_outage() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), MockBackend::new().failing()).await;

        let (status, body) = get(&state, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["graph"], true);
        assert_eq!(body["llm"], false);
    }
}
