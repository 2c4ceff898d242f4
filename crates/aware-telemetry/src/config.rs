//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging, tracing export and metrics output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// OpenTelemetry OTLP endpoint; tracing export is off when unset
    pub otlp_endpoint: Option<String>,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to write logs to the console
    pub console_output: bool,

    /// Whether console logs are JSON instead of human-readable
    pub json_logs: bool,

    /// Print the metrics exposition on shutdown
    pub print_metrics_on_exit: bool,

    /// Deployment environment reported with traces
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "aware-node".to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            print_metrics_on_exit: false,
            environment: "development".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: aware-node)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: unset, no export)
    /// - `AWARE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AWARE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AWARE_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `AWARE_PRINT_METRICS`: Print metrics on exit (default: false)
    /// - `AWARE_ENVIRONMENT`: Deployment environment (default: development)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "aware-node".to_string()),

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.is_empty()),

            log_level: env::var("AWARE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("AWARE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("AWARE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            print_metrics_on_exit: env::var("AWARE_PRINT_METRICS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            environment: env::var("AWARE_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// True when spans should be exported over OTLP.
    pub fn tracing_export_enabled(&self) -> bool {
        self.otlp_endpoint.is_some()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "aware-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.tracing_export_enabled());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
