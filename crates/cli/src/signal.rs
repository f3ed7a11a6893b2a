//! SIGINT/SIGTERM handling for the stdio and HTTP local-serving modes.
//! Races a `tokio::signal::unix` listener against the server's own
//! serve future so a caller that Ctrl-Cs the foreground process still
//! stops every daemon task this supervisor owns before exiting.

use std::sync::Arc;

use runbook_supervisor::ProcessSupervisor;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Wait for SIGINT or SIGTERM, then stop every daemon this supervisor
/// owns before returning. Intended to run as a background task raced
/// against the server's own serve future with `tokio::select!`.
pub async fn wait_and_stop_all(supervisor: Arc<ProcessSupervisor>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(err) => {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    if let Err(err) = supervisor.stop_all().await {
        warn!(error = %err, "stop_all reported failures during shutdown");
    }
}
