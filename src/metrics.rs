//! Metrics for the qualify and dispatch phases.
//!
//! Recording is a no-op until a recorder is installed, so library callers and
//! tests pay nothing. `serve` installs the Prometheus exporter.

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Install the Prometheus exporter with an HTTP listener on `addr`. Idempotent.
pub fn init_metrics(addr: SocketAddr) {
    INIT.call_once(|| {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        match builder.install() {
            Ok(()) => {
                info!("Prometheus exporter listening on http://{}/metrics", addr);
                QualifierMetrics::register_metrics();
                DispatchMetrics::register_metrics();
            }
            Err(e) => {
                warn!("Prometheus exporter install failed (possibly already installed): {}", e);
            }
        }
    });
}

pub struct QualifierMetrics;

impl QualifierMetrics {
    pub fn record_run(total_rows: usize, qualified_rows: usize) {
        ::metrics::counter!("cart_recovery_rows_loaded_total").increment(total_rows as u64);
        ::metrics::counter!("cart_recovery_rows_qualified_total").increment(qualified_rows as u64);
    }

    pub fn record_rejected_upload(reason: &'static str) {
        ::metrics::counter!("cart_recovery_uploads_rejected_total", "reason" => reason).increment(1);
    }

    pub fn record_cache_hit() {
        ::metrics::counter!("cart_recovery_cache_hits_total").increment(1);
    }

    pub fn record_cache_miss() {
        ::metrics::counter!("cart_recovery_cache_misses_total").increment(1);
    }

    fn register_metrics() {
        // Pre-register so they appear on /metrics before first use
        let _ = ::metrics::counter!("cart_recovery_rows_loaded_total");
        let _ = ::metrics::counter!("cart_recovery_rows_qualified_total");
        let _ = ::metrics::counter!("cart_recovery_cache_hits_total");
        let _ = ::metrics::counter!("cart_recovery_cache_misses_total");
    }
}

pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_success(records: usize, duration_secs: f64) {
        ::metrics::counter!("cart_recovery_dispatch_success_total").increment(1);
        ::metrics::counter!("cart_recovery_dispatch_records_total").increment(records as u64);
        ::metrics::histogram!("cart_recovery_dispatch_duration_seconds").record(duration_secs);
    }

    pub fn record_failure(kind: &'static str, duration_secs: f64) {
        ::metrics::counter!("cart_recovery_dispatch_failure_total", "kind" => kind).increment(1);
        ::metrics::histogram!("cart_recovery_dispatch_duration_seconds").record(duration_secs);
    }

    fn register_metrics() {
        let _ = ::metrics::counter!("cart_recovery_dispatch_success_total");
        let _ = ::metrics::counter!("cart_recovery_dispatch_records_total");
        let _ = ::metrics::histogram!("cart_recovery_dispatch_duration_seconds");
    }
}
