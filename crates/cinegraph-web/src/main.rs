//! Cinegraph Web - HTTP API for graph-augmented answers.

use anyhow::Result;
use cinegraph::{AppContext, Config};
use cinegraph_web::{routes, AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cinegraph-web")]
#[command(about = "Cinegraph Web - HTTP API for graph-augmented answers")]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Config file (default: cinegraph.toml in current or parent directories)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    let addr = config.server.addr();

    let ctx = AppContext::open(config).await?;
    let state = AppState::new(ctx);
    let app = routes::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Cinegraph API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Shutting down");
    match state.into_context() {
        Some(ctx) => ctx.close().await,
        None => warn!("Context still shared at shutdown"),
    }
    Ok(())
}
