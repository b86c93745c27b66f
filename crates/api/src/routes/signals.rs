use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use common::Error;
use strategy::{SignalRequest, SignalResponse};

use crate::{ApiError, AppState};

pub fn signals_router() -> Router<AppState> {
    Router::new()
        .route("/api/signals", post(generate_signals))
        .route("/generate-signal", post(generate_signals))
}

async fn generate_signals(
    State(state): State<AppState>,
    payload: Result<Json<SignalRequest>, JsonRejection>,
) -> Result<Json<SignalResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    Ok(Json(state.signals.generate(request).await?))
}
