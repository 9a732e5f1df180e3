use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus recorder"),
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count a finished scan by outcome: completed, failed or cancelled.
pub fn record_scan(outcome: &'static str) {
    ::metrics::counter!("access_scans_total", "outcome" => outcome).increment(1);
}

pub fn record_finding(status: &'static str) {
    ::metrics::counter!("access_findings_total", "status" => status).increment(1);
}

pub fn record_probe_failure() {
    ::metrics::counter!("access_probe_failures_total").increment(1);
}

pub fn record_revocation(status: &'static str, success: bool) {
    ::metrics::counter!(
        "access_revocations_total",
        "status" => status,
        "success" => if success { "true" } else { "false" }
    )
    .increment(1);
}
