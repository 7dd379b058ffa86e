//! Prometheus metrics for server health.
//!
//! The exporter serves its own scrape endpoint; the rest of the server just
//! calls the helpers below at the relevant points.

#![allow(dead_code)]

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on its own listener. Metrics are scraped
/// from `http://<addr>/metrics`.
pub fn init(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))
}

/// One player action accepted by a table.
pub fn action_applied(kind: &str) {
    metrics::counter!("cardroom_actions_total", "kind" => kind.to_string()).increment(1);
}

/// One command rejected with a caller-visible error.
pub fn command_rejected(error_kind: &'static str) {
    metrics::counter!("cardroom_command_errors_total", "kind" => error_kind).increment(1);
}

/// A hand finished (fold-out or showdown).
pub fn hand_completed() {
    metrics::counter!("cardroom_hands_total").increment(1);
}

/// Current number of open WebSocket subscriptions.
pub fn subscribers_delta(delta: i64) {
    metrics::gauge!("cardroom_subscribers_active").increment(delta as f64);
}

/// Number of tables currently running.
pub fn tables_active(count: usize) {
    metrics::gauge!("cardroom_tables_active").set(count as f64);
}
