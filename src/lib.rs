//! Request routing engine for a controller-based web framework.
//!
//! Maps `(method, path)` to a `Controller.Method` action plus captured
//! parameters, builds URLs back from actions, and loads its table from YAML
//! routes documents that can import other modules' routes.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use dispatch::{ActionCall, Dispatch, Dispatcher};
pub use http::HttpServer;
pub use routing::{ActionDefinition, RouteMatch, Router};
