//! Application state for the web server.

use cinegraph::AppContext;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<AppContext>,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn ctx(&self) -> &AppContext {
        &self.ctx
    }

    /// Take the context back once every other handle is gone.
    pub fn into_context(self) -> Option<AppContext> {
        Arc::into_inner(self.ctx)
    }
}
