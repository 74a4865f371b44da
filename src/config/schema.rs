//! Configuration schema definitions.
//!
//! This module defines the application configuration for the router server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::routing::parser::DEFAULT_MAX_IMPORT_DEPTH;

/// Controller name → method name → declared parameter names.
pub type ControllersConfig = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Routes file and reload settings.
    pub routes: RoutesConfig,

    /// Modules that routes documents may import.
    pub modules: Vec<ModuleConfig>,

    /// Known controller actions, used to validate routes and bind fixed params.
    pub controllers: ControllersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Routes file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Root routes document, relative to the config file's directory.
    pub path: PathBuf,

    /// Reload routes when the files change.
    pub watch: bool,

    /// Maximum nesting of module imports.
    pub max_import_depth: usize,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("conf/routes.yml"),
            watch: true,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

/// A module whose `conf/routes.yml` can be imported.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Name used by `import` entries.
    pub name: String,

    /// Base directory of the module.
    pub path: PathBuf,

    /// Inactive modules are skipped by imports.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
