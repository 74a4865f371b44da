//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → dispatch (router lookup, action resolution)
//!     → handler.rs (ActionHandler supplied by the controller layer)
//!     → Send to client
//! ```

pub mod handler;
pub mod server;

pub use handler::{ActionHandler, EchoHandler};
pub use server::{AppState, HttpServer, X_REQUEST_ID};
