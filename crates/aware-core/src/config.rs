//! # Engine Configuration
//!
//! Tuning knobs for the engine and its owner task.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::MAX_TRANSACTION_IDS;

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline of every transaction, in milliseconds.
    pub transaction_timeout_ms: u64,

    /// How long a peer data path request waits for a local answer.
    pub response_grace_ms: u64,

    /// Upper bound on simultaneously pending transactions.
    pub max_pending_transactions: usize,

    /// Period of the owner task's deadline tick.
    pub tick_interval_ms: u64,

    /// Capacity of the request channel into the owner task.
    pub command_queue_capacity: usize,

    /// Capacity of the firmware event channel.
    pub event_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transaction_timeout_ms: 5_000,
            response_grace_ms: 10_000,
            max_pending_transactions: MAX_TRANSACTION_IDS,
            tick_interval_ms: 250,
            command_queue_capacity: 256,
            event_queue_capacity: 1_024,
        }
    }
}

impl EngineConfig {
    /// Create a config for testing (short deadlines, small queues).
    pub fn for_testing() -> Self {
        Self {
            transaction_timeout_ms: 100,
            response_grace_ms: 200,
            max_pending_transactions: 64,
            tick_interval_ms: 10,
            command_queue_capacity: 16,
            event_queue_capacity: 64,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "transaction_timeout_ms must be positive".to_string(),
            ));
        }
        if self.response_grace_ms == 0 {
            return Err(ConfigError::Invalid(
                "response_grace_ms must be positive".to_string(),
            ));
        }
        if !(1..=MAX_TRANSACTION_IDS).contains(&self.max_pending_transactions) {
            return Err(ConfigError::Invalid(format!(
                "max_pending_transactions must be 1..={MAX_TRANSACTION_IDS}"
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.command_queue_capacity == 0 || self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parsing error.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Parsed but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.transaction_timeout_ms, 5_000);
        assert_eq!(config.response_grace_ms, 10_000);
        assert_eq!(config.max_pending_transactions, 65_535);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config_is_valid() {
        assert!(EngineConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = EngineConfig {
            transaction_timeout_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_pending_bound_limited_to_id_space() {
        let config = EngineConfig {
            max_pending_transactions: 70_000,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"response_grace_ms": 42}"#).expect("valid json");
        assert_eq!(config.response_grace_ms, 42);
        assert_eq!(config.tick_interval_ms, 250);
    }
}
