//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing, dispatch, http, watcher produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every HTTP log line (tower-http)
//! - Metrics are cheap (atomic increments) and safe on the lookup hot path

pub mod logging;
pub mod metrics;
