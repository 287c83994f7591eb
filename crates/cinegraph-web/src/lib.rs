//! # Cinegraph Web
//!
//! HTTP API over the question-answering pipeline.
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run -p cinegraph-web -- --port 8000
//! curl 'http://localhost:8000/ask?query=Who%20directed%20Inception'
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Liveness message |
//! | GET | `/ask?query=` | `{"question", "answer"}` |
//! | GET | `/movies?query=` | `{"movies": [...]}`, graph context only |
//! | GET | `/health` | Graph store and LLM reachability |

pub mod routes;
pub mod state;

pub use state::AppState;
