use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::domain::Item;
use crate::errors::NewsboyResult;
use crate::services::Poller;

#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
}

/// Read-only facts for any status display.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub running: bool,
    pub read_count: usize,
    pub unread_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/items", get(items))
        .route("/unread", post(unread))
        .route("/search", get(search))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(state: AppState, bind_addr: &str, shutdown: F) -> NewsboyResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn current_status(poller: &Poller) -> StatusResponse {
    StatusResponse {
        running: poller.is_running(),
        read_count: poller.cache().delivered_count(),
        unread_count: poller.cache().pending_count(),
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(current_status(&state.poller))
}

/// Starts polling in the background; the first cycle is not awaited.
async fn start(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    if !state.poller.is_running() {
        let poller = Arc::clone(&state.poller);
        tokio::spawn(async move {
            poller.start().await;
        });
    }
    (StatusCode::ACCEPTED, Json(current_status(&state.poller)))
}

async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    Json(StopResponse {
        stopped: state.poller.stop(),
    })
}

/// Every known item, read and unread. Does not mark anything read.
async fn items(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.poller.cache().snapshot_all())
}

async fn unread(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.poller.cache().drain_unread())
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Item>> {
    Json(state.poller.cache().search(&params.q))
}
