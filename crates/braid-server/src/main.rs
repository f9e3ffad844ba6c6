//! Braid server binary
//!
//! Semantic conversation routing over an embedding sidecar.

use axum::extract::Request;
use axum::ServiceExt;
use braid_core::RoutingPolicy;
use braid_embed::HttpEmbeddingService;
use braid_server::api;
use braid_server::facts::HeuristicFactExtractor;
use braid_server::state::AppState;
use braid_store::MemoryStore;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::normalize_path::NormalizePath;
use tracing_subscriber::EnvFilter;

/// Braid server CLI
#[derive(Parser, Debug)]
#[command(name = "braid-server")]
#[command(about = "Semantic conversation routing: STAY / ROUTE / BRANCH over branch centroids")]
#[command(version)]
struct Cli {
    /// HTTP API bind address
    #[arg(short, long, default_value = "0.0.0.0:8180")]
    bind: String,

    /// Embedding sidecar base URL
    /// Can also be set via BRAID_EMBEDDING_URL
    #[arg(long)]
    embedding_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn resolve_embedding_url(cli: &Cli) -> String {
    if let Some(url) = &cli.embedding_url {
        return url.clone();
    }
    if let Ok(url) = std::env::var("BRAID_EMBEDDING_URL") {
        if !url.is_empty() {
            return url;
        }
    }
    braid_core::EMBEDDING_BASE_URL_DEFAULT.to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,tower_http=debug",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::info!("Braid server v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = cli
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cli.bind, e))?;

    let policy = RoutingPolicy::from_env();
    policy
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid routing policy: {}", e))?;
    tracing::info!(
        stay = policy.stay_threshold,
        route = policy.route_threshold,
        new_cluster = policy.new_cluster_threshold,
        max_branches = policy.branches_for_context_max,
        "routing policy resolved"
    );

    let embedding_url = resolve_embedding_url(&cli);
    tracing::info!(url = %embedding_url, "embedding sidecar");
    let embeddings = Arc::new(HttpEmbeddingService::new(embedding_url));

    tracing::warn!("Running in-memory store - branch state will NOT survive restarts");
    let store = Arc::new(MemoryStore::new());

    let state = AppState::new(
        store,
        embeddings,
        Arc::new(HeuristicFactExtractor::new()),
        policy,
    );
    let app = api::router(state);

    tracing::info!("Starting HTTP server on {}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /messages                          - Route a message");
    tracing::info!("  POST /drift/route                       - Alias of /messages");
    tracing::info!("  GET  /health                            - Health check");
    tracing::info!("  GET  /conversations/{{id}}/branches       - Inspect branch tree");
    tracing::info!("  GET  /branches/{{id}}/facts               - Extracted facts");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = NormalizePath::trim_trailing_slash(app);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
