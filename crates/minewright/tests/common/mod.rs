//! Common test utilities.

use axum::Router;
use tokio::sync::watch;

use minewright::server;
use minewright::supervisor::StatusSnapshot;

/// Build the status app around a snapshot the test controls.
pub fn test_app(snapshot: StatusSnapshot) -> (watch::Sender<StatusSnapshot>, Router) {
    let (status_tx, status_rx) = watch::channel(snapshot);
    (status_tx, server::build_app(status_rx))
}
