//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build registries → Router::refresh (fatal on error)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown of the HTTP server
//!     SIGHUP → Router::refresh (errors logged, old routes kept)
//! ```

pub mod signals;
pub mod startup;

pub use startup::{build_application, load_application, Application, StartupError};
