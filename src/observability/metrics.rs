//! Metrics collection and exposition.
//!
//! # Metrics
//! - `soft_redirects_total` (counter): redirects emitted, by status
//! - `soft_redirect_misses_total` (counter): not-found requests left as 404
//! - `historic_urls_recorded_total` (counter): history entries added
//! - `store_errors_total` (counter): store failures, by operation

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_redirect(status: u16) {
    counter!("soft_redirects_total", "status" => status.to_string()).increment(1);
}

pub fn record_redirect_miss() {
    counter!("soft_redirect_misses_total").increment(1);
}

pub fn record_history_insert() {
    counter!("historic_urls_recorded_total").increment(1);
}

pub fn record_store_error(op: &'static str) {
    counter!("store_errors_total", "op" => op).increment(1);
}
