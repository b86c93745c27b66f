use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use common::{normalize_symbol, Error};

use crate::{ApiError, AppState};

pub fn otc_router() -> Router<AppState> {
    Router::new().route("/api/otcdata", get(latest_candle))
}

#[derive(Deserialize)]
struct OtcQuery {
    asset: Option<String>,
}

/// Latest relayed candle for one asset.
async fn latest_candle(
    State(state): State<AppState>,
    Query(q): Query<OtcQuery>,
) -> Result<Response, ApiError> {
    let asset = q
        .asset
        .as_deref()
        .map(normalize_symbol)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| Error::InvalidRequest("asset is required".into()))?;

    let Some(tick) = state.latest.get(&asset).await else {
        return Ok((StatusCode::NOT_FOUND, Json(json!({ "error": "No data yet" }))).into_response());
    };

    let candle = tick.candle.as_ref();
    Ok(Json(json!({
        "asset": asset,
        "price": tick.price,
        "open": candle.map(|c| c.open),
        "high": candle.map(|c| c.high),
        "low": candle.map(|c| c.low),
        "start": candle.map(|c| c.timestamp),
        "timestamp": tick.timestamp,
    }))
    .into_response())
}
