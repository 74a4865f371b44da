//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the module and action registries
//! - Create the router and load the routes table
//!
//! # Design Decisions
//! - Fail fast: a routes table that does not load is fatal at boot
//! - Relative paths in the config resolve against the config file's directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_config, AppConfig, ConfigError};
use crate::dispatch::Dispatcher;
use crate::routing::{ControllerRegistry, ModuleTable, RouteError, Router, RoutesParser};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load routes: {0}")]
    Routes(#[from] RouteError),
}

/// Everything built from configuration at startup.
pub struct Application {
    pub config: AppConfig,
    pub base_dir: PathBuf,
    pub router: Arc<Router>,
    pub actions: Arc<ControllerRegistry>,
}

impl Application {
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::clone(&self.router), self.actions.clone())
    }
}

/// Build the router from a loaded config without touching the routes file.
pub fn build_router(config: &AppConfig, base_dir: &Path) -> (Arc<Router>, Arc<ControllerRegistry>) {
    let modules = Arc::new(ModuleTable::from_config(&config.modules, base_dir));
    let actions = Arc::new(ControllerRegistry::from_config(&config.controllers));
    let parser = RoutesParser::new(modules)
        .with_actions(actions.clone())
        .with_max_import_depth(config.routes.max_import_depth);

    let router = Arc::new(Router::new(base_dir.join(&config.routes.path), parser));
    (router, actions)
}

/// Build the application and perform the initial routes load.
pub fn build_application(config: AppConfig, base_dir: &Path) -> Result<Application, StartupError> {
    let (router, actions) = build_router(&config, base_dir);

    if let Err(e) = router.refresh() {
        tracing::error!("Failed to load routes:\n{}", e.render());
        return Err(e.into());
    }

    Ok(Application {
        config,
        base_dir: base_dir.to_path_buf(),
        router,
        actions,
    })
}

/// Load the config file at `config_path` and build the application.
pub fn load_application(config_path: &Path) -> Result<Application, StartupError> {
    let config = load_config(config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    build_application(config, base_dir)
}
