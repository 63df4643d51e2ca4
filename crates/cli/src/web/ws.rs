// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket endpoint feeding status and metric events to the dashboard.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use super::AppState;

/// `GET /ws` — WebSocket upgrade for a dashboard client.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Per-connection loop. The subscription side drives output; the read
/// side exists so a peer disconnect surfaces as a stream end and
/// unregisters the subscriber — client messages themselves are ignored.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let mut sub = state.hub.subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            event = sub.events.recv() => {
                let Some(event) = event else {
                    // Evicted by the hub (slow consumer) — hang up.
                    break;
                };
                let Ok(text) = serde_json::to_string(&event) else {
                    break;
                };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    debug!("ignoring dashboard client message: {text}");
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("dashboard connection read error: {e}");
                    break;
                }
                _ => {}
            },
        }
    }

    state.hub.unsubscribe(sub.id);
    debug!("dashboard connection ended");
}
