//! # Aware Telemetry
//!
//! Observability for the aware engine.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter and a pretty or JSON
//!   console layer
//! - **Traces**: optional OpenTelemetry OTLP export
//! - **Metrics**: Prometheus counters, gauges and a latency histogram
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aware_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).await.expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP endpoint, enables span export |
//! | `OTEL_SERVICE_NAME` | `aware-node` | Service name in traces |
//! | `AWARE_LOG_LEVEL` | `info` | Log level filter |
//! | `AWARE_JSON_LOGS` | `false` | JSON console logs |
//! | `AWARE_PRINT_METRICS` | `false` | Print metrics on exit |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, DATA_PATHS_ACTIVE,
    DISCOVERY_SESSIONS_ACTIVE, MATCHES_TOTAL, SUBMISSIONS_REJECTED, TRANSACTIONS_COMPLETED,
    TRANSACTIONS_ISSUED, TRANSACTION_LATENCY,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, tracing export and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, they need no runtime
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        print_metrics_on_exit: config.print_metrics_on_exit,
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    print_metrics_on_exit: bool,
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
        if self.print_metrics_on_exit {
            match gather_metrics() {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("Error gathering metrics: {e}"),
            }
        }
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_telemetry_installs_subscriber_once() {
        let config = TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::default()
        };

        let guard = init_telemetry(config.clone()).await;
        assert!(guard.is_ok());
        assert!(gather_metrics().is_ok());

        // The global subscriber is already set
        assert!(matches!(
            init_telemetry(config).await,
            Err(TelemetryError::TracerInit(_))
        ));
    }

    #[test]
    fn test_metric_macros() {
        register_metrics().expect("registered");
        metric_inc!(MATCHES_TOTAL);
        metric_inc!(SUBMISSIONS_REJECTED, &["unknown_peer"]);
        metric_observe!(TRANSACTION_LATENCY, &["disable"], 0.004);

        assert!(MATCHES_TOTAL.get() >= 1);
        assert!(
            SUBMISSIONS_REJECTED
                .with_label_values(&["unknown_peer"])
                .get()
                >= 1
        );
    }
}
