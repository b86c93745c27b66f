use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use tracing::{debug, warn};

use crate::AppState;

pub fn feed_router() -> Router<AppState> {
    Router::new().route("/ws/feed", get(ws_feed_handler))
}

/// WebSocket endpoint streaming relayed ticks as JSON text frames.
async fn ws_feed_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let (id, mut tick_rx) = state.broadcaster.subscribe().await;

    loop {
        tokio::select! {
            tick = tick_rx.recv() => {
                // None: the broadcaster dropped us for falling behind
                let Some(tick) = tick else { break };
                let text = match serde_json::to_string(&tick) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode tick");
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.broadcaster.unsubscribe(id).await;
    debug!(subscriber = %id, "Feed client disconnected");
}
