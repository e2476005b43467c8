//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, method, status
//! - `gateway_request_duration_seconds` (histogram): pipeline latency
//! - `gateway_rejections_total` (counter): short-circuited requests by stage
//! - `gateway_routes_loaded` (gauge): routes mounted at startup
//! - `gateway_rate_limit_clients` (gauge): tracked client keys
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(stage: &'static str) {
    counter!("gateway_rejections_total", "stage" => stage).increment(1);
}

pub fn record_routes_loaded(loaded: usize, failed: usize) {
    gauge!("gateway_routes_loaded").set(loaded as f64);
    gauge!("gateway_route_failures").set(failed as f64);
}

pub fn record_rate_limit_clients(clients: usize) {
    gauge!("gateway_rate_limit_clients").set(clients as f64);
}
