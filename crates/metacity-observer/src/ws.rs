//! `WebSocket` handler streaming resource summaries.
//!
//! Clients connect to `GET /ws/summaries` and receive the current
//! [`ResourceSummary`] immediately, then one JSON text frame after every
//! applied action. A client that falls behind skips to the newest summary.
//!
//! [`ResourceSummary`]: metacity_core::ResourceSummary

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade to a `WebSocket` and stream summaries.
///
/// # Route
///
/// `GET /ws/summaries`
pub async fn ws_summaries(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize summary: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.simulation.subscribe_summaries();
    if !send_json(&mut socket, &state.simulation.snapshot().summary()).await {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(summary) => {
                    if !send_json(&mut socket, &summary).await {
                        debug!("WebSocket client disconnected (send failed)");
                        return;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                }
                Err(RecvError::Closed) => {
                    debug!("Summary channel closed, shutting down WebSocket");
                    return;
                }
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client disconnected");
                    return;
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    debug!("WebSocket error: {e}");
                    return;
                }
                // Clients have nothing to say on this socket.
                Some(Ok(_)) => {}
            },
        }
    }
}
