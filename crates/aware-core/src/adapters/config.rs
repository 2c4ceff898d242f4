use crate::config::EngineConfig;
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider.
///
/// Useful for testing and development. For production, use `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: EngineConfig,
}

impl StaticConfigProvider {
    /// Create with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole config.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the transaction deadline.
    #[must_use]
    pub fn with_transaction_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.transaction_timeout_ms = timeout_ms;
        self
    }

    /// Override the peer response grace period.
    #[must_use]
    pub fn with_response_grace_ms(mut self, grace_ms: u64) -> Self {
        self.config.response_grace_ms = grace_ms;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn engine_config(&self) -> EngineConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Production Config Loading (requires "toml-config" feature)
// ============================================================================

#[cfg(feature = "toml-config")]
mod toml_config {
    use super::*;
    use crate::config::ConfigError;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;

    /// Configuration file structure.
    #[derive(Debug, Deserialize)]
    struct ConfigFile {
        #[serde(default)]
        engine: EngineSection,
    }

    #[derive(Debug, Deserialize, Default)]
    struct EngineSection {
        transaction_timeout_ms: Option<u64>,
        response_grace_ms: Option<u64>,
        max_pending_transactions: Option<usize>,
        tick_interval_ms: Option<u64>,
        command_queue_capacity: Option<usize>,
        event_queue_capacity: Option<usize>,
    }

    /// TOML-based configuration provider.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [engine]
    /// transaction_timeout_ms = 5000
    /// response_grace_ms = 10000
    /// max_pending_transactions = 65535
    /// tick_interval_ms = 250
    /// command_queue_capacity = 256
    /// event_queue_capacity = 1024
    /// ```
    ///
    /// Missing keys take their defaults.
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        config: EngineConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if file cannot be read, parsed or validated.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let defaults = EngineConfig::default();
            let section = file.engine;
            let config = EngineConfig {
                transaction_timeout_ms: section
                    .transaction_timeout_ms
                    .unwrap_or(defaults.transaction_timeout_ms),
                response_grace_ms: section
                    .response_grace_ms
                    .unwrap_or(defaults.response_grace_ms),
                max_pending_transactions: section
                    .max_pending_transactions
                    .unwrap_or(defaults.max_pending_transactions),
                tick_interval_ms: section.tick_interval_ms.unwrap_or(defaults.tick_interval_ms),
                command_queue_capacity: section
                    .command_queue_capacity
                    .unwrap_or(defaults.command_queue_capacity),
                event_queue_capacity: section
                    .event_queue_capacity
                    .unwrap_or(defaults.event_queue_capacity),
            };
            config.validate()?;

            Ok(Self { config })
        }

        /// The parsed config.
        pub fn config(&self) -> &EngineConfig {
            &self.config
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn engine_config(&self) -> EngineConfig {
            self.config.clone()
        }
    }
}

#[cfg(feature = "toml-config")]
pub use toml_config::TomlConfigProvider;
