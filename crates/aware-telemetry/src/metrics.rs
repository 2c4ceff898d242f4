//! Prometheus metrics for the aware engine.
//!
//! All metrics follow the naming convention: `aware_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: transactions issued/completed, rejected submissions, matches
//! - **Gauge**: active discovery sessions and data paths
//! - **Histogram**: issue-to-completion latency

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding only the aware metrics
    static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRANSACTION METRICS
    // =========================================================================

    /// Commands handed to the firmware
    pub static ref TRANSACTIONS_ISSUED: IntCounterVec = IntCounterVec::new(
        Opts::new("aware_transactions_issued_total", "Commands handed to the firmware"),
        &["kind"]
    ).expect("metric creation failed");

    /// Resolved transactions
    pub static ref TRANSACTIONS_COMPLETED: IntCounterVec = IntCounterVec::new(
        Opts::new("aware_transactions_completed_total", "Resolved transactions"),
        &["kind", "outcome"]  // outcome: success/firmware_error/timeout/aborted/invalid_completion
    ).expect("metric creation failed");

    /// Requests refused before a transaction was allocated
    pub static ref SUBMISSIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("aware_submissions_rejected_total", "Requests rejected at submission"),
        &["reason"]
    ).expect("metric creation failed");

    /// Issue-to-completion latency
    pub static ref TRANSACTION_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "aware_transaction_latency_seconds",
            "Time from issuing a command to its resolution"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid buckets")),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // SESSION AND DATA PATH METRICS
    // =========================================================================

    /// Discovery sessions currently numbered
    pub static ref DISCOVERY_SESSIONS_ACTIVE: IntGauge = IntGauge::new(
        "aware_discovery_sessions_active",
        "Discovery sessions currently active"
    ).expect("metric creation failed");

    /// Confirmed data paths
    pub static ref DATA_PATHS_ACTIVE: IntGauge = IntGauge::new(
        "aware_data_paths_active",
        "Data paths currently confirmed"
    ).expect("metric creation failed");

    /// Discovery matches reported
    pub static ref MATCHES_TOTAL: IntCounter = IntCounter::new(
        "aware_matches_total",
        "Discovery matches reported by the firmware"
    ).expect("metric creation failed");
}

/// Handle proving metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRANSACTIONS_ISSUED.clone()),
        Box::new(TRANSACTIONS_COMPLETED.clone()),
        Box::new(SUBMISSIONS_REJECTED.clone()),
        Box::new(TRANSACTION_LATENCY.clone()),
        Box::new(DISCOVERY_SESSIONS_ACTIVE.clone()),
        Box::new(DATA_PATHS_ACTIVE.clone()),
        Box::new(MATCHES_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Render all metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
