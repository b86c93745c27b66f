mod error;
pub mod routes;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::Result;
use feed::{Broadcaster, LatestCandles};
use strategy::SignalService;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub signals: Arc<SignalService>,
    /// Live feed subscriber registry.
    pub broadcaster: Broadcaster,
    pub latest: LatestCandles,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::signals_router())
        .merge(routes::otc_router())
        .merge(routes::feed_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Signal API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
