//! OS signal handling.
//!
//! # Responsibilities
//! - Resolve a future on SIGINT/SIGTERM for graceful shutdown
//! - Refresh the routes table on SIGHUP
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a routes reload, not shutdown
//! - Reloads run on the blocking pool; request routing never waits on them

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::routing::Router;

/// Wait for Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Refresh `router` every time the process receives SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(router: Arc<Router>) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading routes...");
            let router = Arc::clone(&router);
            match tokio::task::spawn_blocking(move || router.refresh()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Failed to reload routes: {}. Keeping current routes.", e),
                Err(e) => tracing::error!(error = %e, "Routes reload task panicked"),
            }
        }
    }))
}
