//! HTTP API built on Axum.
//!
//! Includes:
//! - `data`: generic key/value routes under `/data`.
//! - `snapshots`: progress snapshots and best scores under `/snapshots`.
//! - `players`: profiles and coin ledgers under `/players`.

mod data;
mod extract;
mod players;
mod snapshots;

#[cfg(test)]
mod routes_test;

use crate::db::DynStore;
use crate::error::Result;
use axum::{
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
}

async fn index() -> &'static str {
    ""
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Builds the full route table over the given store.
pub fn router(store: DynStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/data", post(data::create).get(data::read))
        .route("/data/:key", put(data::update).delete(data::delete))
        .route("/snapshots", post(snapshots::receive))
        .route("/snapshots/best", get(snapshots::best))
        .route(
            "/players",
            post(players::create).get(players::find_by_username),
        )
        .route("/players/:id", get(players::get).put(players::update))
        .route("/players/:id/earn", post(players::earn))
        .route("/players/:id/spend", post(players::spend))
        .route("/players/:id/transactions", get(players::transactions))
        .route("/players/:id/balance", get(players::balance))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { store })
}

/// Binds `addr`, spawns the server in the background and returns the bound address
/// (useful when the port is 0).
pub async fn bind(addr: SocketAddr, store: DynStore) -> Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Server listening on {}", local_addr);

    let app = router(store);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });
    Ok(local_addr)
}

/// Serves in the foreground until Ctrl-C.
pub async fn serve(addr: SocketAddr, store: DynStore) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
