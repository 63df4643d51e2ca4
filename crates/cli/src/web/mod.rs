// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/WebSocket status edge for the live dashboard.

pub mod auth;
pub mod ws;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Options;
use crate::git;
use crate::hub::{Event, Hub};
use crate::status::StatusStore;

/// How often metric events go out to subscribers.
const METRICS_CADENCE: Duration = Duration::from_secs(1);

/// Shared state for web handlers.
pub struct AppState {
    pub opts: Arc<Options>,
    pub store: Arc<StatusStore>,
    pub hub: Hub,
}

/// Build the dashboard router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/devices", get(devices))
        .route("/changes", get(changes))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard until the process exits. Also owns the 1 Hz
/// metrics heartbeat.
pub async fn serve(opts: Arc<Options>, store: Arc<StatusStore>, hub: Hub) -> anyhow::Result<()> {
    let state = Arc::new(AppState { opts: Arc::clone(&opts), store, hub: hub.clone() });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&opts.web_listen).await?;
    info!("web server started on {}", opts.web_listen);

    tokio::spawn(metrics_heartbeat(hub, opts.devices.len()));

    axum::serve(listener, app).await?;
    Ok(())
}

/// One entry of the `/devices` snapshot: the status plus a coarse age
/// label for the last transition.
#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeviceView {
    status: crate::status::DeviceStatus,
    ago: String,
}

/// `GET /devices` — snapshot of the status table.
async fn devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = std::time::SystemTime::now();
    let view: BTreeMap<String, DeviceView> = state
        .store
        .get_all()
        .into_iter()
        .map(|(hostname, status)| {
            let elapsed = now.duration_since(status.when).unwrap_or_default();
            (hostname, DeviceView { status, ago: crate::util::time_ago(elapsed) })
        })
        .collect();
    Json(view)
}

/// `GET /changes` — recent commit history, one line per commit.
async fn changes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match git::log_oneline(&state.opts.workspace, 20).await {
        Ok(lines) => Json(lines),
        Err(e) => {
            // A fresh repository has no log yet.
            warn!("reading commit history failed: {e}");
            Json(Vec::new())
        }
    }
}

async fn metrics_heartbeat(hub: Hub, device_count: usize) {
    let mut tick = tokio::time::interval(METRICS_CADENCE);
    loop {
        tick.tick().await;
        let mut metrics = BTreeMap::new();
        metrics.insert(
            "tasks".to_owned(),
            tokio::runtime::Handle::current().metrics().num_alive_tasks().to_string(),
        );
        metrics.insert("devices".to_owned(), device_count.to_string());
        hub.broadcast(Event::metric(metrics));
    }
}
