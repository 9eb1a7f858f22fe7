//! Routing gateway service.
//!
//! A long-lived axum server that accepts Anthropic- and OpenAI-style
//! chat/completion requests, resolves the model field against the route
//! table, and forwards to the matched backend with its live credential.
//! The table is built from a fresh catalog fetch at startup (the disk
//! snapshot is bypassed so secrets are always current) and replaced
//! wholesale on `POST /reload`.

mod forward;
mod routes;
mod table;

pub use table::{RouteTable, RouteTarget};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower::limit::ConcurrencyLimitLayer;
use tracing::info;

use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::registry::ProviderRegistry;

/// Shared state behind every handler.
pub struct AppState {
    pub(crate) registry: ProviderRegistry,
    pub(crate) catalog: ModelCatalog,
    pub(crate) table: RwLock<RouteTable>,
    pub(crate) client: reqwest::Client,
    pub(crate) timeout: Duration,
}

/// Builds the gateway router over prepared state. In-flight requests are
/// capped so a slow upstream backs pressure up to callers instead of
/// accumulating unbounded forwards.
fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/v1/models", get(routes::list_models))
        .route("/reload", post(routes::reload))
        .route("/v1/messages", post(routes::forward_request))
        .route("/v1/chat/completions", post(routes::forward_request))
        .layer(ConcurrencyLimitLayer::new(
            crate::constants::GATEWAY_MAX_IN_FLIGHT,
        ))
        .with_state(state)
}

/// Runs the gateway until the process is stopped.
///
/// Startup performs one live catalog fetch; an all-providers failure here
/// is fatal since an empty route table can serve nothing.
pub async fn serve(config: &Config, registry: ProviderRegistry, host: &str, port: u16) -> Result<()> {
    let catalog = ModelCatalog::new(registry.clone(), config)?;
    let snapshot = catalog
        .fetch_all()
        .await
        .context("Initial catalog fetch failed; gateway cannot start without routes")?;
    let table = RouteTable::build(&snapshot, &registry);
    info!(routes = table.len(), "route table built");

    let state = Arc::new(AppState {
        registry,
        catalog,
        table: RwLock::new(table),
        client: reqwest::Client::new(),
        timeout: Duration::from_secs(config.gateway.timeout_secs),
    });

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind gateway to {addr}"))?;
    info!(%addr, "gateway listening");

    axum::serve(listener, app(state))
        .await
        .context("Gateway server error")?;
    Ok(())
}
