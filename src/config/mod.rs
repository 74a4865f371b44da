//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → lifecycle::startup builds registries and the router from it
//!
//! On routes change:
//!     watcher.rs detects change
//!     → Router::refresh (parse, validate, build)
//!     → atomic swap of the routing generation
//!     → in-flight requests keep the generation they loaded
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the routes table reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ModuleConfig, ObservabilityConfig, RoutesConfig, ServerConfig};
pub use watcher::{ReloadEvent, RoutesWatcher};
