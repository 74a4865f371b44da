//! Router server.
//!
//! ```text
//!   Client Request
//!   ─────────────▶ http server ──▶ dispatch ──▶ routing (generation snapshot)
//!                                     │
//!                                     ▼
//!   ◀───────────── ActionHandler (controller layer; echo in this binary)
//!
//!   conf/routes.yml ─┬─ watcher (notify) ─┐
//!                    └─ SIGHUP ───────────┴─▶ Router::refresh → atomic swap
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use action_router::config::{load_config, RoutesWatcher};
use action_router::http::{AppState, EchoHandler, HttpServer};
use action_router::lifecycle::{build_application, signals};
use action_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "action-router")]
#[command(about = "Serve requests through a YAML-defined routing table", long_about = None)]
struct Args {
    /// Application config file.
    #[arg(short, long, default_value = "app.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!("action-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        routes = %config.routes.path.display(),
        modules = config.modules.len(),
        watch = config.routes.watch,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let base_dir = args.config.parent().map(PathBuf::from).unwrap_or_default();
    let app = build_application(config, &base_dir)?;

    // Dropping the watcher stops it, so keep it for the life of the server.
    let _watcher = if app.config.routes.watch {
        let (watcher, mut events) = RoutesWatcher::new(Arc::clone(&app.router));
        let watcher = watcher.run()?;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracing::debug!(?event, "Routes reload finished");
            }
        });
        Some(watcher)
    } else {
        None
    };

    #[cfg(unix)]
    signals::spawn_reload_on_hangup(Arc::clone(&app.router))?;

    let state = AppState::new(app.dispatcher(), Arc::new(EchoHandler));
    let listener = TcpListener::bind(&app.config.server.bind_address).await?;
    let server = HttpServer::new(&app.config.server, state);
    server.run(listener, signals::shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
