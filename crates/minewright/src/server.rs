//! HTTP status server.

use axum::Router;
use axum::routing::get;
use tokio::sync::watch;

use crate::handlers;
use crate::supervisor::StatusSnapshot;

#[derive(Clone)]
pub struct AppState {
    pub status: watch::Receiver<StatusSnapshot>,
}

/// Build the status app.
///
/// Deployment probes hit arbitrary paths, so every route serves the same
/// status document.
pub fn build_app(status: watch::Receiver<StatusSnapshot>) -> Router {
    Router::new()
        .fallback(get(handlers::status::status))
        .with_state(AppState { status })
}
