//! `minewright serve` — run the agent.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use minewright::bridge::SubprocessConnector;
use minewright::config::Config;
use minewright::routines::RoutineSet;
use minewright::server;
use minewright::supervisor::Supervisor;

pub async fn run(
    config_path: &str,
    host_override: Option<String>,
    port_override: Option<u16>,
    username_override: Option<String>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;
    config.apply_env();

    // CLI overrides environment and config
    if let Some(host) = host_override {
        config.server.host = host;
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(username) = username_override {
        config.server.username = username;
    }

    let config = Arc::new(config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (supervisor, supervisor_task) = Supervisor::spawn(
        config.clone(),
        Arc::new(SubprocessConnector),
        shutdown_rx.clone(),
    );
    let routines = RoutineSet::start(&config, &supervisor);

    // Status server, only in deployments that ask for it
    let http_task = if config.http.enabled {
        let app = server::build_app(supervisor.status_stream());
        let addr = SocketAddr::from(([0, 0, 0, 0], config.http.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind status server on {addr}"))?;
        info!(addr = %addr, "Status server listening");

        let mut http_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = http_shutdown.wait_for(|stop| *stop).await;
                })
                .await;
            if let Err(e) = served {
                warn!(error = %e, "Status server failed");
            }
        }))
    } else {
        None
    };

    shutdown_signal().await;

    // Tear down in order: everything observes the shutdown flag, then the
    // routines are cancelled, then we wait for the supervisor to close the
    // session and for the HTTP server to drain.
    let _ = shutdown_tx.send(true);
    routines.shutdown().await;
    if let Err(e) = supervisor_task.await {
        warn!(error = %e, "Supervisor task failed");
    }
    if let Some(task) = http_task {
        let _ = task.await;
    }

    info!("Agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
