//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_changes_total` (counter): change signals published
//! - `connector_rebuilds_total` (counter): rebuilds by connector, outcome
//! - `connector_cache_hits_total` (counter): gets served from cache by connector
//! - `service_bindings` (gauge): bindings in the current tree
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (library use)
//! - `init_metrics` installs the Prometheus exporter (binary use)

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, "Failed to install metrics exporter: {}", e),
    }
}

pub fn record_config_change() {
    counter!("config_changes_total").increment(1);
}

pub fn record_rebuild(connector: &str, outcome: &'static str) {
    counter!(
        "connector_rebuilds_total",
        "connector" => connector.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_cache_hit(connector: &str) {
    counter!("connector_cache_hits_total", "connector" => connector.to_string()).increment(1);
}

pub fn record_binding_count(count: usize) {
    gauge!("service_bindings").set(count as f64);
}
