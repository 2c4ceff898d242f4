//! # Node Configuration
//!
//! Engine tuning comes from an optional TOML file named by `AWARE_CONFIG`,
//! then individual environment overrides. Telemetry settings are read by
//! `aware_telemetry::TelemetryConfig::from_env`.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `AWARE_CONFIG` | Path of a TOML file with an `[engine]` table |
//! | `AWARE_TXN_TIMEOUT_MS` | Overrides `transaction_timeout_ms` |
//! | `AWARE_RESPONSE_GRACE_MS` | Overrides `response_grace_ms` |

use std::path::PathBuf;

use aware_core::{ConfigError, ConfigProvider, EngineConfig, TomlConfigProvider};
use aware_telemetry::TelemetryConfig;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Logging, tracing and metrics output.
    pub telemetry: TelemetryConfig,
    /// File the engine section was read from, if any.
    pub config_path: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    /// The engine section could not be loaded or is unusable.
    #[error(transparent)]
    Engine(#[from] ConfigError),

    /// An override variable is not a valid number.
    #[error("{variable}={value} is not a valid millisecond value")]
    InvalidOverride {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig, NodeConfigError> {
    let mut config = load_config_with(|key| std::env::var(key).ok())?;
    config.telemetry = TelemetryConfig::from_env();
    Ok(config)
}

/// Load configuration, resolving variables through `lookup`.
///
/// Telemetry is left at its defaults.
pub fn load_config_with<F>(lookup: F) -> Result<NodeConfig, NodeConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = lookup("AWARE_CONFIG")
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let mut engine = match &config_path {
        Some(path) => TomlConfigProvider::load(path)?.engine_config(),
        None => EngineConfig::default(),
    };

    if let Some(timeout_ms) = parse_override(&lookup, "AWARE_TXN_TIMEOUT_MS")? {
        engine.transaction_timeout_ms = timeout_ms;
    }
    if let Some(grace_ms) = parse_override(&lookup, "AWARE_RESPONSE_GRACE_MS")? {
        engine.response_grace_ms = grace_ms;
    }
    engine.validate()?;

    Ok(NodeConfig {
        engine,
        telemetry: TelemetryConfig::default(),
        config_path,
    })
}

fn parse_override<F>(lookup: &F, variable: &'static str) -> Result<Option<u64>, NodeConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| NodeConfigError::InvalidOverride { variable, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load_config_with(lookup_from(&[])).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let config = load_config_with(lookup_from(&[
            ("AWARE_TXN_TIMEOUT_MS", "750"),
            ("AWARE_RESPONSE_GRACE_MS", " 3000 "),
        ]))
        .unwrap();
        assert_eq!(config.engine.transaction_timeout_ms, 750);
        assert_eq!(config.engine.response_grace_ms, 3_000);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let err = load_config_with(lookup_from(&[("AWARE_TXN_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            NodeConfigError::InvalidOverride {
                variable: "AWARE_TXN_TIMEOUT_MS",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_override_fails_validation() {
        let err = load_config_with(lookup_from(&[("AWARE_RESPONSE_GRACE_MS", "0")])).unwrap_err();
        assert!(matches!(err, NodeConfigError::Engine(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_file_then_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\ntransaction_timeout_ms = 900\nresponse_grace_ms = 4000").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = load_config_with(lookup_from(&[
            ("AWARE_CONFIG", path.as_str()),
            ("AWARE_RESPONSE_GRACE_MS", "6000"),
        ]))
        .unwrap();
        assert_eq!(config.engine.transaction_timeout_ms, 900);
        assert_eq!(config.engine.response_grace_ms, 6_000);
        assert_eq!(config.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config_with(lookup_from(&[("AWARE_CONFIG", "/nonexistent/aware.toml")]))
            .unwrap_err();
        assert!(matches!(err, NodeConfigError::Engine(ConfigError::Io { .. })));
    }
}
