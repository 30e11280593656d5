//! Metrics collection and Prometheus export.
//!
//! HTTP request metrics come from the shared middleware; this module adds the
//! model-call counter and owns the exporter behind `/metrics`.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// This must be called once at startup before any metrics are recorded.
/// Panics if called more than once.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Count one model call. `outcome` is `ok` or an error kind.
pub fn record_model_call(kind: &'static str, outcome: &'static str) {
    counter!("model_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_render_placeholder() {
        record_model_call("event", "ok");
        if METRICS_HANDLE.get().is_none() {
            assert_eq!(get_metrics(), "# Metrics recorder not initialized");
        }
    }
}
