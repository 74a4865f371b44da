//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (lookups, refreshes, table size)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_lookups_total` (counter): forward lookups by outcome
//!   (`matched`, `explicit_404`, `no_route`, `unresolved`, `unloaded`)
//! - `router_refresh_total` (counter): refreshes by result (`ok`, `error`)
//! - `router_refresh_duration_seconds` (histogram): time to parse and build
//! - `router_routes` (gauge): routes in the published generation
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users and
//!   tests pay nothing
//! - Labels are fixed strings (no request paths) to keep cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one forward lookup.
pub fn record_lookup(outcome: &'static str) {
    metrics::counter!("router_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a refresh attempt; `routes` is the new table size on success.
pub fn record_refresh(success: bool, started: Instant, routes: Option<usize>) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("router_refresh_total", "result" => result).increment(1);
    metrics::histogram!("router_refresh_duration_seconds").record(started.elapsed().as_secs_f64());
    if let Some(count) = routes {
        metrics::gauge!("router_routes").set(count as f64);
    }
}
