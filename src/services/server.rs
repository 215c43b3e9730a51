//! HTTP server for the reviewer assignment API.
//!
//! Builds the axum router over the team and pull request services and runs it
//! until the cancellation token fires.

use crate::services::api::{pull_request_api_routes, team_api_routes};
use crate::services::pull_requests::PullRequestService;
use crate::services::teams::TeamService;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub pull_requests: PullRequestService,
    pub teams: TeamService,
}

/// Build the full router.
///
/// Requests that run past `request_timeout` are dropped with 408; dropping
/// the handler future rolls back any transaction it had open.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(team_api_routes())
        .merge(pull_request_api_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(request_deadline(request_timeout))
}

fn request_deadline(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

/// Serve `app` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("[server] Listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .inspect_err(|e| log::error!("[server] Server error: {}", e))?;

    log::info!("[server] Server stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// Unmatched paths get the same error envelope as handler failures.
async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "code": "NOT_FOUND", "message": "route not found" } })),
    )
        .into_response()
}
